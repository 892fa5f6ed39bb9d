//! SlotGrid selection — weighted, non-repeating role claims.
//!
//! Each entry of weight *w* is expanded into *w* slots. A selection pass
//! shuffles the slots and tries to claim them one at a time through a
//! [`Locker`](slotgrid_lock::Locker); the first claimed slot's entry wins.
//! When every slot is already claimed the pass falls back to a uniform
//! pick over the slots, which is weight-proportional over entries.
//!
//! # Components
//!
//! - **`slot`** — slot expansion, claim-order shuffle, weighted pick
//! - **`key`** — lock key derivation
//! - **`selector`** — the selection state machine (`select`, `select_random`)

pub mod error;
pub mod key;
pub mod selector;
pub mod slot;

pub use error::{SelectError, SelectResult};
pub use key::lock_key;
pub use selector::{Outcome, Selection, Selector};
pub use slot::{Slot, claim_order, expand_slots, weighted_pick};
