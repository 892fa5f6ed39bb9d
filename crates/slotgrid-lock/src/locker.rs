//! The check-and-set seam between the selector and its lock backend.

use std::sync::Arc;

use crate::error::{LockError, LockResult};

/// Outcome of a successful round trip to the lock backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// The key was free and now belongs to this caller.
    Acquired,
    /// Someone already holds the key. Re-acquiring a key this caller
    /// already owns also lands here.
    AlreadyHeld,
}

impl Acquire {
    pub fn is_acquired(self) -> bool {
        matches!(self, Acquire::Acquired)
    }
}

/// A backend exposing one atomic check-and-set on string keys.
///
/// Implementations must not split the check from the set: two callers
/// racing on the same key must see exactly one [`Acquire::Acquired`].
/// Per-call timeouts are the implementation's responsibility.
pub trait Locker {
    fn acquire(&self, key: &str) -> LockResult<Acquire>;
}

impl<L: Locker + ?Sized> Locker for &L {
    fn acquire(&self, key: &str) -> LockResult<Acquire> {
        (**self).acquire(key)
    }
}

impl<L: Locker + ?Sized> Locker for Arc<L> {
    fn acquire(&self, key: &str) -> LockResult<Acquire> {
        (**self).acquire(key)
    }
}

impl<L: Locker + ?Sized> Locker for Box<L> {
    fn acquire(&self, key: &str) -> LockResult<Acquire> {
        (**self).acquire(key)
    }
}

/// A missing backend behaves like one with no reachable replicas: every
/// acquire fails.
impl<L: Locker> Locker for Option<L> {
    fn acquire(&self, key: &str) -> LockResult<Acquire> {
        match self {
            Some(locker) => locker.acquire(key),
            None => Err(LockError::Unavailable("no lock backend configured".to_string())),
        }
    }
}
