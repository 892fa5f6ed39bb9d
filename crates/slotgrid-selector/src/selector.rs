//! Selector — claims one weighted slot per pass through the lock backend.
//!
//! ```text
//! select()
//!   expand roster → slots (empty → EmptyRoster)
//!   shuffle claim order
//!   for each slot, sequentially:
//!     acquire(lock_key)
//!       Acquired    → Outcome::Claimed
//!       AlreadyHeld → sleep lock_delay, next slot
//!       Err         → SelectError::LockBackend (stop)
//!   every slot held → Outcome::RandomFallback
//! ```
//!
//! Backend errors are returned to the caller as-is. Whether to degrade to
//! [`Selector::select_random`] after one is the caller's decision.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use slotgrid_core::{Entry, Roster, SelectorConfig};
use slotgrid_lock::{Acquire, Locker};
use slotgrid_metrics::{NoopObserver, SelectionObserver};
use tracing::debug;

use crate::error::{SelectError, SelectResult};
use crate::key::lock_key;
use crate::slot::{claim_order, expand_slots, weighted_pick};

/// How the selected entry was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// This process now holds `key`, slot `slot` of the entry.
    Claimed { key: String, slot: u32 },
    /// No lock was taken; the entry was drawn by weight.
    RandomFallback,
}

/// The result of a successful selection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub entry: Entry,
    pub outcome: Outcome,
}

impl Selection {
    pub fn identifier(&self) -> &str {
        &self.entry.identifier
    }

    pub fn is_random(&self) -> bool {
        self.outcome == Outcome::RandomFallback
    }
}

/// Selects one entry from a roster, claiming a slot through `L` when one
/// is free.
///
/// The random source `R` is owned by the selector; use
/// [`Selector::seeded`] or [`Selector::with_rng`] for reproducible runs.
pub struct Selector<L, R = StdRng> {
    config: SelectorConfig,
    roster: Roster,
    locker: L,
    rng: R,
    observer: Arc<dyn SelectionObserver>,
}

impl<L: Locker> Selector<L, StdRng> {
    /// Create a selector with an entropy-seeded random source.
    pub fn new(config: SelectorConfig, roster: Roster, locker: L) -> Self {
        Self::with_rng(config, roster, locker, StdRng::from_entropy())
    }

    /// Create a selector whose claim order and fallback picks are fixed
    /// by `seed`.
    pub fn seeded(config: SelectorConfig, roster: Roster, locker: L, seed: u64) -> Self {
        Self::with_rng(config, roster, locker, StdRng::seed_from_u64(seed))
    }
}

impl<L: Locker, R: Rng> Selector<L, R> {
    pub fn with_rng(config: SelectorConfig, roster: Roster, locker: L, rng: R) -> Self {
        Self {
            config,
            roster,
            locker,
            rng,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Report outcomes of every pass to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn SelectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn locker(&self) -> &L {
        &self.locker
    }

    /// Claim a slot and return its entry, or fall back to a weighted
    /// random entry when every slot is already claimed.
    ///
    /// Only completed passes report a pick time, so a caller that degrades
    /// to [`select_random`](Self::select_random) after a backend error
    /// records one timing per role handed out.
    pub fn select(&mut self) -> SelectResult<Selection> {
        let start = Instant::now();
        let result = self.claim();
        if result.is_ok() {
            self.observer.time_to_pick(start.elapsed());
        }
        self.report(&result);
        result
    }

    /// Pick an entry by weight without touching the lock backend.
    pub fn select_random(&mut self) -> SelectResult<Selection> {
        let start = Instant::now();
        let result = self.pick_random();
        if result.is_ok() {
            self.observer.time_to_pick(start.elapsed());
        }
        self.report(&result);
        result
    }

    fn claim(&mut self) -> SelectResult<Selection> {
        let slots = expand_slots(&self.roster);
        if slots.is_empty() {
            return Err(SelectError::EmptyRoster);
        }
        let order = claim_order(slots, &mut self.rng);
        let debug_mode = self.config.debug_mode;
        let last = order.len() - 1;

        for (attempt, slot) in order.iter().enumerate() {
            let key = lock_key(&self.config, &slot.entry.identifier, slot.index);
            if debug_mode {
                debug!(%key, attempt, "attempting to lock key");
            }

            match self.locker.acquire(&key) {
                Ok(Acquire::Acquired) => {
                    debug!(%key, role = %slot.entry.identifier, "slot claimed");
                    return Ok(Selection {
                        entry: slot.entry.clone(),
                        outcome: Outcome::Claimed {
                            key,
                            slot: slot.index,
                        },
                    });
                }
                Ok(Acquire::AlreadyHeld) => {
                    if debug_mode {
                        debug!(%key, "could not lock key");
                    }
                }
                Err(source) => return Err(SelectError::LockBackend { key, source }),
            }

            if attempt < last && !self.config.lock_delay.is_zero() {
                if debug_mode {
                    debug!(delay = ?self.config.lock_delay, "sleeping before next attempt");
                }
                std::thread::sleep(self.config.lock_delay);
            }
        }

        if debug_mode {
            debug!("all keys locked, selecting random entry");
        }
        self.pick_random()
    }

    fn pick_random(&mut self) -> SelectResult<Selection> {
        let entry = weighted_pick(&self.roster, &mut self.rng).ok_or(SelectError::EmptyRoster)?;
        Ok(Selection {
            entry: entry.clone(),
            outcome: Outcome::RandomFallback,
        })
    }

    fn report(&self, result: &SelectResult<Selection>) {
        match result {
            Ok(selection) => {
                self.observer.role_chosen(selection.identifier());
                if selection.is_random() {
                    self.observer.random_role_chosen();
                }
            }
            Err(_) => self.observer.role_error(),
        }
    }
}
