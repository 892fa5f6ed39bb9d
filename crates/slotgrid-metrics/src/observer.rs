//! The observer seam the selector reports through.

use std::sync::Arc;
use std::time::Duration;

/// Receives selection outcomes. Every method must return promptly and
/// must swallow its own failures.
pub trait SelectionObserver: Send + Sync {
    /// Wall time spent on one selection pass.
    fn time_to_pick(&self, _elapsed: Duration) {}

    /// The role handed to the caller, however it was chosen.
    fn role_chosen(&self, _identifier: &str) {}

    /// The role came from weighted-random choice rather than a claim.
    fn random_role_chosen(&self) {}

    /// The pass failed (lock backend error or empty roster).
    fn role_error(&self) {}

    /// Push buffered samples to their destination.
    fn flush(&self) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SelectionObserver for NoopObserver {}

impl<O: SelectionObserver + ?Sized> SelectionObserver for Arc<O> {
    fn time_to_pick(&self, elapsed: Duration) {
        (**self).time_to_pick(elapsed)
    }

    fn role_chosen(&self, identifier: &str) {
        (**self).role_chosen(identifier)
    }

    fn random_role_chosen(&self) {
        (**self).random_role_chosen()
    }

    fn role_error(&self) {
        (**self).role_error()
    }

    fn flush(&self) {
        (**self).flush()
    }
}
