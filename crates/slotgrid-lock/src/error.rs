//! Error types for lock backends.

use thiserror::Error;

/// Result type alias for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Errors a lock backend can report.
///
/// Any of these aborts the current selection pass; the selector never
/// retries against a backend that has failed once.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to open lock store: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("lock backend unavailable: {0}")]
    Unavailable(String),
}
