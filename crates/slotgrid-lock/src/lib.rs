//! slotgrid-lock — the coordination substrate for SlotGrid selection.
//!
//! The selector only needs one primitive from its backend: an atomic
//! check-and-set on a string key that reports whether the key was newly
//! acquired or already held. [`Locker`] is that seam.
//!
//! [`LockStore`] is the bundled backend, built on
//! [redb](https://docs.rs/redb). Every acquire runs inside a single write
//! transaction, and redb serializes write transactions, so the
//! check and the set cannot interleave with another writer.
//!
//! # Layout
//!
//! Claims are keyed by their full lock key
//! (`{application}/{selection}/{digest}/{slot}`), so listing or resetting
//! a selection namespace is a prefix scan.

pub mod error;
pub mod locker;
pub mod store;
pub mod tables;

pub use error::{LockError, LockResult};
pub use locker::{Acquire, Locker};
pub use store::{Claim, LockStore};
