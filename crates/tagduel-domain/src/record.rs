//! Output relational records
//!
//! Posts, tags and tag pairs each live in their own identifier space. Ids are
//! strictly positive and assigned by the relationship builder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an output record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A post
    Post,
    /// A tag occurrence belonging to one post
    Tag,
    /// A competitor pair of two tag occurrences
    TagPair,
}

impl RecordKind {
    /// All record kinds, in export order
    pub const ALL: [RecordKind; 3] = [RecordKind::Post, RecordKind::Tag, RecordKind::TagPair];

    /// Stable lowercase name (used for fixture model names and table names)
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Post => "post",
            RecordKind::Tag => "tag",
            RecordKind::TagPair => "tagpair",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post record
#[derive(Debug, Clone, PartialEq)]
pub struct PostRow {
    /// Post id
    pub id: u64,
    /// Redacted post text
    pub text: String,
    /// Author id
    pub uid: Option<String>,
    /// Author time zone
    pub time_zone: Option<String>,
    /// Latitude
    pub lat: Option<f64>,
    /// Longitude
    pub lon: Option<f64>,
}

/// Tag record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    /// Tag id
    pub id: u64,
    /// Tag text, without the leading `#`
    pub text: String,
    /// Owning post id
    pub post: u64,
}

/// Competitor pair record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPairRow {
    /// Pair id
    pub id: u64,
    /// First tag occurrence
    pub tag1: TagOccurrence,
    /// Second tag occurrence
    pub tag2: TagOccurrence,
    /// Vote count, zero at creation
    pub votes: u64,
}

/// One tag text drawn from one specific post
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagOccurrence {
    /// Id of the tag record for this occurrence
    pub tag_id: u64,
    /// Tag text
    pub text: String,
}

/// Any output record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Post record
    Post(PostRow),
    /// Tag record
    Tag(TagRow),
    /// Competitor pair record
    TagPair(TagPairRow),
}

impl Record {
    /// The record's type
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Post(_) => RecordKind::Post,
            Record::Tag(_) => RecordKind::Tag,
            Record::TagPair(_) => RecordKind::TagPair,
        }
    }

    /// The record's id
    pub fn id(&self) -> u64 {
        match self {
            Record::Post(row) => row.id,
            Record::Tag(row) => row.id,
            Record::TagPair(row) => row.id,
        }
    }

    /// Reassign the record's id
    pub fn set_id(&mut self, id: u64) {
        match self {
            Record::Post(row) => row.id = id,
            Record::Tag(row) => row.id = id,
            Record::TagPair(row) => row.id = id,
        }
    }
}
