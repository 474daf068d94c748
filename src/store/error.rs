//! Storage error types

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a position store or one of its sessions
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// Reading or writing the backing file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be decoded into device or sample records
    #[error("malformed store data: {details}")]
    Malformed { details: String },

    /// Pending writes could not be made durable
    #[error("commit failed: {reason}")]
    CommitFailed { reason: String },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
