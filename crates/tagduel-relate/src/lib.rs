//! Tagduel Relate
//!
//! Turns parsed posts into relational records and exports them.
//!
//! # Overview
//!
//! ```text
//! PostRecord → RelationshipBuilder → RecordStore
//!                                  → fixture document
//! PostRecord → BatchWriter → batch file → BatchReader → PostRecord
//! ```
//!
//! The [`RelationshipBuilder`] gives every post, tag and tag pair an id in its
//! own id space and writes the record through a
//! [`RecordStore`](tagduel_domain::RecordStore). A tag pair ("competitors")
//! joins two tag occurrences with different text; every such pair over
//! everything ingested is created exactly once.
//!
//! # Example
//!
//! ```
//! use tagduel_domain::PostRecord;
//! use tagduel_relate::{write_fixtures, BuilderConfig, RelationshipBuilder};
//!
//! let mut builder = RelationshipBuilder::new(BuilderConfig::default());
//! builder.ingest(&PostRecord::new("#x #y", None)).unwrap();
//! builder.ingest(&PostRecord::new("#y #z", None)).unwrap();
//! builder.ingest(&PostRecord::new("no tags", None)).unwrap();
//! builder.build_pairs().unwrap();
//!
//! assert_eq!(builder.stats().summary(), "3 posts, 4 tags, 5 pairs (0 id conflicts)");
//!
//! let mut fixture = Vec::new();
//! let entries = write_fixtures(&mut fixture, builder.records(), "tagduel").unwrap();
//! assert_eq!(entries, 12);
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [builder]
//! max_id_retries = 10000
//! app_label = "tagduel"
//! verbose = true
//! ```

#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod export;
mod stats;


pub use builder::RelationshipBuilder;
pub use config::BuilderConfig;
pub use error::{BuildError, ExportError};
pub use export::{fixture_entries, write_fixtures, BatchReader, BatchWriter, FixtureEntry};
pub use stats::BuildStats;
