//! Tagduel Storage Layer
//!
//! Implements the `RecordStore` trait on SQLite, plus an in-memory store for
//! fixture builds and tests.
//!
//! Both stores enforce per-type id uniqueness: creating a record whose id is
//! already taken fails with `CreateError::Conflict`, which the relationship
//! builder answers by retrying with the next id.
//!
//! # Examples
//!
//! ```no_run
//! use tagduel_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for record writes
//! ```

#![warn(missing_docs)]

mod memory;

pub use memory::MemoryStore;

use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::path::Path;
use tagduel_domain::{
    CreateError, PostRow, Record, RecordKind, RecordStore, TagOccurrence, TagPairRow, TagRow,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of RecordStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tagduel_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("tagduel.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        tracing::debug!("Opened record store at {}", path.display());
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn table(kind: RecordKind) -> &'static str {
        match kind {
            RecordKind::Post => "posts",
            RecordKind::Tag => "tags",
            RecordKind::TagPair => "tag_pairs",
        }
    }

    /// Primary-key or unique constraint failure
    fn is_id_conflict(err: &rusqlite::Error) -> bool {
        match err {
            rusqlite::Error::SqliteFailure(e, _) => {
                e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
            }
            _ => false,
        }
    }

    fn to_db_id(id: u64) -> Result<i64, StoreError> {
        i64::try_from(id).map_err(|_| StoreError::InvalidData(format!("Id out of range: {}", id)))
    }

    fn insert(&self, record: &Record) -> Result<usize, rusqlite::Error> {
        match record {
            Record::Post(row) => self.conn.execute(
                "INSERT INTO posts (id, text, uid, time_zone, lat, lon)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![row.id as i64, &row.text, &row.uid, &row.time_zone, row.lat, row.lon],
            ),
            Record::Tag(row) => self.conn.execute(
                "INSERT INTO tags (id, text, post_id) VALUES (?1, ?2, ?3)",
                params![row.id as i64, &row.text, row.post as i64],
            ),
            Record::TagPair(row) => self.conn.execute(
                "INSERT INTO tag_pairs (id, tag1_id, tag2_id, votes) VALUES (?1, ?2, ?3, ?4)",
                params![
                    row.id as i64,
                    row.tag1.tag_id as i64,
                    row.tag2.tag_id as i64,
                    row.votes as i64,
                ],
            ),
        }
    }

    /// Number of records of a type
    pub fn count(&self, kind: RecordKind) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::table(kind));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get a post by id
    pub fn get_post(&self, id: u64) -> Result<Option<PostRow>, StoreError> {
        let post = self
            .conn
            .query_row(
                "SELECT id, text, uid, time_zone, lat, lon FROM posts WHERE id = ?1",
                params![Self::to_db_id(id)?],
                |row| {
                    Ok(PostRow {
                        id: row.get::<_, i64>(0)? as u64,
                        text: row.get(1)?,
                        uid: row.get(2)?,
                        time_zone: row.get(3)?,
                        lat: row.get(4)?,
                        lon: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(post)
    }

    /// Get a tag by id
    pub fn get_tag(&self, id: u64) -> Result<Option<TagRow>, StoreError> {
        let tag = self
            .conn
            .query_row(
                "SELECT id, text, post_id FROM tags WHERE id = ?1",
                params![Self::to_db_id(id)?],
                |row| {
                    Ok(TagRow {
                        id: row.get::<_, i64>(0)? as u64,
                        text: row.get(1)?,
                        post: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(tag)
    }

    /// Get a tag pair by id, with both tag texts resolved
    pub fn get_tag_pair(&self, id: u64) -> Result<Option<TagPairRow>, StoreError> {
        let pair = self
            .conn
            .query_row(
                "SELECT p.id, p.tag1_id, t1.text, p.tag2_id, t2.text, p.votes
                 FROM tag_pairs p
                 JOIN tags t1 ON t1.id = p.tag1_id
                 JOIN tags t2 ON t2.id = p.tag2_id
                 WHERE p.id = ?1",
                params![Self::to_db_id(id)?],
                |row| {
                    Ok(TagPairRow {
                        id: row.get::<_, i64>(0)? as u64,
                        tag1: TagOccurrence {
                            tag_id: row.get::<_, i64>(1)? as u64,
                            text: row.get(2)?,
                        },
                        tag2: TagOccurrence {
                            tag_id: row.get::<_, i64>(3)? as u64,
                            text: row.get(4)?,
                        },
                        votes: row.get::<_, i64>(5)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(pair)
    }

    /// Tags extracted from one post
    pub fn tags_for_post(&self, post_id: u64) -> Result<Vec<TagRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, text, post_id FROM tags WHERE post_id = ?1 ORDER BY id")?;

        let tags = stmt
            .query_map(params![Self::to_db_id(post_id)?], |row| {
                Ok(TagRow {
                    id: row.get::<_, i64>(0)? as u64,
                    text: row.get(1)?,
                    post: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn create(&mut self, record: &Record) -> Result<(), CreateError<Self::Error>> {
        Self::to_db_id(record.id()).map_err(CreateError::Backend)?;

        match self.insert(record) {
            Ok(_) => Ok(()),
            Err(e) if Self::is_id_conflict(&e) => Err(CreateError::Conflict {
                kind: record.kind(),
                id: record.id(),
            }),
            Err(e) => Err(CreateError::Backend(StoreError::Database(e))),
        }
    }

    fn max_id(&self, kind: RecordKind) -> Result<Option<u64>, Self::Error> {
        let sql = format!("SELECT MAX(id) FROM {}", Self::table(kind));
        let max: Option<i64> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(max.map(|id| id as u64))
    }

    fn tag_occurrences(&self) -> Result<Vec<TagOccurrence>, Self::Error> {
        let mut stmt = self.conn.prepare("SELECT id, text FROM tags ORDER BY id")?;

        let occurrences = stmt
            .query_map([], |row| {
                Ok(TagOccurrence {
                    tag_id: row.get::<_, i64>(0)? as u64,
                    text: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(occurrences)
    }
}
