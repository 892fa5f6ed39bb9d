//! Slot expansion and claim ordering.

use rand::Rng;
use rand::seq::SliceRandom;
use slotgrid_core::{Entry, Roster};

/// One claimable unit of an entry's weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot<'a> {
    pub entry: &'a Entry,
    /// In `0..entry.weight`.
    pub index: u32,
}

/// Expand a roster into its slots: roster order, then slot index
/// ascending. Entries with weight zero contribute nothing.
pub fn expand_slots(roster: &Roster) -> Vec<Slot<'_>> {
    roster
        .entries()
        .iter()
        .flat_map(|entry| (0..entry.weight).map(move |index| Slot { entry, index }))
        .collect()
}

/// Shuffle slots into a uniformly random claim order (Fisher–Yates).
pub fn claim_order<'a, R: Rng + ?Sized>(mut slots: Vec<Slot<'a>>, rng: &mut R) -> Vec<Slot<'a>> {
    slots.shuffle(rng);
    slots
}

/// Pick one slot uniformly and return its entry. Returns `None` when the
/// roster has no slots.
pub fn weighted_pick<'a, R: Rng + ?Sized>(roster: &'a Roster, rng: &mut R) -> Option<&'a Entry> {
    expand_slots(roster).choose(rng).map(|slot| slot.entry)
}
