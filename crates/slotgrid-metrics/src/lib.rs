//! slotgrid-metrics — observability for SlotGrid selections.
//!
//! The selector reports each pass to a [`SelectionObserver`] after the
//! fact. Observers are infallible by signature: a metrics sink that cannot
//! record drops the sample and at most logs it.
//!
//! # Architecture
//!
//! ```text
//! SelectionObserver
//!   ├── NoopObserver        ← default when nothing is configured
//!   └── MetricsCollector
//!         ├── time_to_pick() / role_chosen() / random_role_chosen() / role_error()
//!         ├── snapshot() → MetricsSnapshot
//!         └── flush() → Prometheus textfile (if configured)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain exposition of a snapshot
//! ```

pub mod collector;
pub mod observer;
pub mod prometheus;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use observer::{NoopObserver, SelectionObserver};
pub use prometheus::render_prometheus;
