//! In-memory record store

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::convert::Infallible;
use tagduel_domain::{CreateError, Record, RecordKind, RecordStore, TagOccurrence};

/// In-memory implementation of RecordStore
///
/// Keeps every committed record and enforces per-type id uniqueness the same
/// way the SQLite store does. Ids can be reserved up front to stand in for
/// rows written by another process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<RecordKind, BTreeMap<u64, Record>>,
    reserved: HashMap<RecordKind, BTreeSet<u64>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark ids as taken without storing a record
    pub fn reserve(&mut self, kind: RecordKind, ids: impl IntoIterator<Item = u64>) {
        self.reserved.entry(kind).or_default().extend(ids);
    }

    /// Whether an id is taken, by a record or a reservation
    pub fn is_taken(&self, kind: RecordKind, id: u64) -> bool {
        self.records.get(&kind).is_some_and(|rows| rows.contains_key(&id))
            || self.reserved.get(&kind).is_some_and(|ids| ids.contains(&id))
    }

    /// Committed records of a type, in id order
    pub fn records(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records.get(&kind).into_iter().flat_map(|rows| rows.values())
    }

    /// Number of committed records of a type
    pub fn count(&self, kind: RecordKind) -> usize {
        self.records.get(&kind).map_or(0, BTreeMap::len)
    }
}

impl RecordStore for MemoryStore {
    type Error = Infallible;

    fn create(&mut self, record: &Record) -> Result<(), CreateError<Self::Error>> {
        let kind = record.kind();
        let id = record.id();
        if self.is_taken(kind, id) {
            return Err(CreateError::Conflict { kind, id });
        }
        self.records.entry(kind).or_default().insert(id, record.clone());
        Ok(())
    }

    fn max_id(&self, kind: RecordKind) -> Result<Option<u64>, Self::Error> {
        let committed = self.records.get(&kind).and_then(|rows| rows.keys().next_back());
        let reserved = self.reserved.get(&kind).and_then(|ids| ids.iter().next_back());
        Ok(committed.max(reserved).copied())
    }

    fn tag_occurrences(&self) -> Result<Vec<TagOccurrence>, Self::Error> {
        Ok(self
            .records(RecordKind::Tag)
            .filter_map(|record| match record {
                Record::Tag(row) => Some(TagOccurrence {
                    tag_id: row.id,
                    text: row.text.clone(),
                }),
                _ => None,
            })
            .collect())
    }
}
