//! Error types for building and exporting records

use tagduel_domain::RecordKind;
use thiserror::Error;

/// Errors that can occur while building records
#[derive(Error, Debug)]
pub enum BuildError {
    /// Every id in the retry window was already taken
    #[error("No free {kind} id between {first} and {last}")]
    AllocationExhausted {
        /// Record type being allocated
        kind: RecordKind,
        /// First id attempted
        first: u64,
        /// Last id attempted
        last: u64,
    },

    /// Record store failure other than an id conflict
    #[error("Store error: {0}")]
    Store(String),
}

/// Errors that can occur while reading or writing batch and fixture files
#[derive(Error, Debug)]
pub enum ExportError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
