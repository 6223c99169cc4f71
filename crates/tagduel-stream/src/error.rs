//! Error types for stream operations

use tagduel_domain::FeedError;
use thiserror::Error;

/// Errors that end a stream session or poll loop
#[derive(Error, Debug)]
pub enum StreamError {
    /// Fatal feed error (authorization or I/O)
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Batch handler failed
    #[error("Batch handler error: {0}")]
    Handler(String),
}
