//! Error types for the CLI application.

use tagduel_domain::FeedError;
use tagduel_relate::{BuildError, ExportError};
use tagduel_store::StoreError;
use tagduel_stream::{HandlerError, StreamError};
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feed could not be opened
    #[error("{0}")]
    Feed(#[from] FeedError),

    /// Stream session or poller error
    #[error("{0}")]
    Stream(#[from] StreamError),

    /// Relationship builder error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Batch or fixture file error
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Database error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl HandlerError for CliError {
    /// Build and database failures leave the pairing state unusable
    fn is_fatal(&self) -> bool {
        matches!(self, CliError::Build(_) | CliError::Store(_))
    }
}
