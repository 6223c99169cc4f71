//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and the
//! collaborators that supply posts and persist records. Implementations live
//! in other crates.

use crate::record::{Record, RecordKind, TagOccurrence};
use crate::RawPost;
use thiserror::Error;

/// Errors a feed can report while pulling a post
#[derive(Error, Debug)]
pub enum FeedError {
    /// One item could not be decoded; the feed itself is still usable
    #[error("Malformed post: {0}")]
    Malformed(String),

    /// Credentials were rejected; fatal for the session
    #[error("Feed authorization failed: {0}")]
    Unauthorized(String),

    /// Underlying I/O failure
    #[error("Feed I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Whether the session can skip this error and keep pulling
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FeedError::Malformed(_))
    }
}

/// Source of raw posts
///
/// Implemented by feed adapters (tagduel-stream)
pub trait PostFeed {
    /// Pull the next post, blocking if necessary
    ///
    /// `Ok(None)` signals that the feed is exhausted.
    fn next_post(&mut self) -> Result<Option<RawPost>, FeedError>;
}

impl<F: PostFeed + ?Sized> PostFeed for &mut F {
    fn next_post(&mut self) -> Result<Option<RawPost>, FeedError> {
        (**self).next_post()
    }
}

impl<F: PostFeed + ?Sized> PostFeed for Box<F> {
    fn next_post(&mut self) -> Result<Option<RawPost>, FeedError> {
        (**self).next_post()
    }
}

/// Failure to create a record
#[derive(Error, Debug)]
pub enum CreateError<E> {
    /// The id is already taken for this record type
    #[error("{kind} id {id} is already taken")]
    Conflict {
        /// Record type
        kind: RecordKind,
        /// Rejected id
        id: u64,
    },

    /// Any other backend failure
    #[error("Store backend error: {0}")]
    Backend(#[source] E),
}

/// Persistence backend for output records
///
/// Implemented by the infrastructure layer (tagduel-store)
pub trait RecordStore {
    /// Error type for backend failures
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a record with the id it carries
    ///
    /// Must fail with [`CreateError::Conflict`] when the id is already
    /// taken for the record's type.
    fn create(&mut self, record: &Record) -> Result<(), CreateError<Self::Error>>;

    /// Highest committed id for a record type
    fn max_id(&self, kind: RecordKind) -> Result<Option<u64>, Self::Error>;

    /// Every committed tag as an occurrence, in id order
    fn tag_occurrences(&self) -> Result<Vec<TagOccurrence>, Self::Error>;
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    type Error = S::Error;

    fn create(&mut self, record: &Record) -> Result<(), CreateError<Self::Error>> {
        (**self).create(record)
    }

    fn max_id(&self, kind: RecordKind) -> Result<Option<u64>, Self::Error> {
        (**self).max_id(kind)
    }

    fn tag_occurrences(&self) -> Result<Vec<TagOccurrence>, Self::Error> {
        (**self).tag_occurrences()
    }
}
