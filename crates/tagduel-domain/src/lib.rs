//! Tagduel Domain Layer
//!
//! Core model for turning social-media posts into tag competitor pairs.
//! This crate holds no I/O; it defines the parsed post, the output records,
//! and the trait interfaces that the feed and persistence layers implement.
//!
//! ## Key Concepts
//!
//! - **Post**: one ingested message and its metadata
//! - **Flat metadata**: every key of the nested metadata lifted to one level
//! - **Tag**: a hashtag extracted from a post
//! - **Occurrence**: one tag text drawn from one specific post
//! - **Tag pair**: an unordered pair of distinct-text occurrences, put up for a vote

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod flatten;
pub mod post;
pub mod raw;
pub mod record;
pub mod tokenize;
pub mod traits;

// Re-exports for convenience
pub use flatten::{FlatMetadata, MetaValue};
pub use post::{Coordinates, PostRecord};
pub use raw::RawPost;
pub use record::{PostRow, Record, RecordKind, TagOccurrence, TagPairRow, TagRow};
pub use tokenize::{Tokenizer, TokenizerKind};
pub use traits::{CreateError, FeedError, PostFeed, RecordStore};
