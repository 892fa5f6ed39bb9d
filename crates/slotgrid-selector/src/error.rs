//! Selector error types.

use slotgrid_lock::LockError;
use thiserror::Error;

/// Errors that end a selection pass.
///
/// Exhausting every slot is not an error; it yields
/// [`Outcome::RandomFallback`](crate::Outcome::RandomFallback).
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("roster has no claimable slots")]
    EmptyRoster,

    #[error("lock backend failed on {key}: {source}")]
    LockBackend {
        key: String,
        #[source]
        source: LockError,
    },
}

pub type SelectResult<T> = Result<T, SelectError>;
