//! Tagduel Stream - pulling and filtering posts from a feed
//!
//! A [`StreamSession`] pulls raw posts from any [`PostFeed`], keeps the ones
//! that pass the [`StreamFilter`], and stops after a configured number of
//! accepted posts. The [`Poller`] repeats this on a schedule.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use tagduel_stream::{JsonlFeed, StreamConfig, StreamSession};
//!
//! let capture = concat!(
//!     r#"{"text": "go #rust", "lang": "en", "entities": {"hashtags": [{"text": "rust"}]}}"#, "\n",
//!     r#"{"text": "allez", "lang": "fr"}"#, "\n",
//! );
//!
//! let feed = JsonlFeed::new(Cursor::new(capture));
//! let (posts, report) = StreamSession::new(feed, &StreamConfig::default()).run().unwrap();
//!
//! assert_eq!(posts.len(), 1);
//! assert_eq!(report.rejected, 1);
//! assert!(posts[0].tags().contains("rust"));
//! ```
//!
//! [`PostFeed`]: tagduel_domain::PostFeed

#![warn(missing_docs)]

mod cancel;
mod config;
mod error;
mod feed;
mod filter;
mod poller;
mod session;

pub use cancel::CancelToken;
pub use config::StreamConfig;
pub use error::StreamError;
pub use feed::{JsonlFeed, VecFeed};
pub use filter::{Rejection, StreamFilter};
pub use poller::{HandlerError, Poller};
pub use session::{SessionReport, StreamSession};
