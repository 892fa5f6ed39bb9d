//! Metrics collector — counts selection outcomes in process.
//!
//! Counters are atomics; per-role counts sit behind a mutex since the
//! role set is only known at runtime.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use slotgrid_core::MetricsConfig;
use tracing::{debug, warn};

use crate::observer::SelectionObserver;
use crate::prometheus::{render_prometheus, sanitize_name};

const DEFAULT_NAMESPACE: &str = "slotgrid";

/// Label added to per-role samples; user tags may not reuse it.
const ROLE_LABEL: &str = "role";

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub picks: u64,
    pub pick_time_total: Duration,
    pub last_pick_time: Duration,
    /// Role identifier → times chosen.
    pub roles_assigned: BTreeMap<String, u64>,
    pub random_roles_chosen: u64,
    pub errors: u64,
}

/// Collects selection metrics and optionally exports them as a
/// Prometheus textfile on [`flush`](SelectionObserver::flush).
pub struct MetricsCollector {
    namespace: String,
    labels: Vec<(String, String)>,
    textfile: Option<std::path::PathBuf>,
    picks: AtomicU64,
    pick_time_total_us: AtomicU64,
    last_pick_time_us: AtomicU64,
    random_roles_chosen: AtomicU64,
    errors: AtomicU64,
    roles_assigned: Mutex<BTreeMap<String, u64>>,
}

impl MetricsCollector {
    /// Create a collector from metrics settings. Tags that are not
    /// `key=value` (or `key:value`) are ignored with a warning.
    pub fn new(config: &MetricsConfig) -> Self {
        let labels = config
            .tags
            .iter()
            .filter_map(|tag| {
                let Some((key, value)) = parse_tag(tag) else {
                    warn!(%tag, "ignoring malformed metrics tag (expected '<key>=<value>')");
                    return None;
                };
                if sanitize_name(&key) == ROLE_LABEL {
                    warn!(%tag, "ignoring metrics tag that collides with the role label");
                    return None;
                }
                Some((key, value))
            })
            .collect();

        Self {
            namespace: config
                .namespace
                .clone()
                .filter(|ns| !ns.is_empty())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            labels,
            textfile: config.textfile.clone(),
            picks: AtomicU64::new(0),
            pick_time_total_us: AtomicU64::new(0),
            last_pick_time_us: AtomicU64::new(0),
            random_roles_chosen: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            roles_assigned: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn labels(&self) -> &[(String, String)] {
        &self.labels
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let roles_assigned = self
            .roles_assigned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        MetricsSnapshot {
            picks: self.picks.load(Ordering::Relaxed),
            pick_time_total: Duration::from_micros(self.pick_time_total_us.load(Ordering::Relaxed)),
            last_pick_time: Duration::from_micros(self.last_pick_time_us.load(Ordering::Relaxed)),
            roles_assigned,
            random_roles_chosen: self.random_roles_chosen.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Render the current counters in Prometheus text format.
    pub fn render(&self) -> String {
        render_prometheus(&self.snapshot(), &self.namespace, &self.labels)
    }

    fn write_textfile(&self, path: &Path) -> std::io::Result<()> {
        // Write beside the target and rename so scrapers never see a
        // partial file.
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())?;
        std::fs::rename(&tmp, path)
    }
}

impl SelectionObserver for MetricsCollector {
    fn time_to_pick(&self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.picks.fetch_add(1, Ordering::Relaxed);
        self.pick_time_total_us.fetch_add(us, Ordering::Relaxed);
        self.last_pick_time_us.store(us, Ordering::Relaxed);
        debug!(metric = "time_to_pick_role", ?elapsed, "metric: timing");
    }

    fn role_chosen(&self, identifier: &str) {
        let mut roles = self
            .roles_assigned
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *roles.entry(identifier.to_string()).or_insert(0) += 1;
        debug!(metric = "role_assigned", role = %identifier, "metric: incr");
    }

    fn random_role_chosen(&self) {
        self.random_roles_chosen.fetch_add(1, Ordering::Relaxed);
        debug!(metric = "random_role_chosen", "metric: incr");
    }

    fn role_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        debug!(metric = "errors", "metric: incr");
    }

    fn flush(&self) {
        let Some(path) = &self.textfile else {
            return;
        };
        match self.write_textfile(path) {
            Ok(()) => debug!(?path, "metrics textfile written"),
            Err(e) => warn!(?path, error = %e, "failed to write metrics textfile"),
        }
    }
}

fn parse_tag(tag: &str) -> Option<(String, String)> {
    let (key, value) = tag.split_once('=').or_else(|| tag.split_once(':'))?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> MetricsCollector {
        MetricsCollector::new(&MetricsConfig::default())
    }

    #[test]
    fn counts_roles_and_fallbacks() {
        let c = collector();
        c.role_chosen("blue");
        c.role_chosen("blue");
        c.role_chosen("green");
        c.random_role_chosen();
        c.role_error();

        let snap = c.snapshot();
        assert_eq!(snap.roles_assigned.get("blue"), Some(&2));
        assert_eq!(snap.roles_assigned.get("green"), Some(&1));
        assert_eq!(snap.random_roles_chosen, 1);
        assert_eq!(snap.errors, 1);
    }

    #[test]
    fn timing_accumulates() {
        let c = collector();
        c.time_to_pick(Duration::from_millis(3));
        c.time_to_pick(Duration::from_millis(5));
        let snap = c.snapshot();
        assert_eq!(snap.picks, 2);
        assert_eq!(snap.pick_time_total, Duration::from_millis(8));
        assert_eq!(snap.last_pick_time, Duration::from_millis(5));
    }

    #[test]
    fn default_namespace_when_unset() {
        assert_eq!(collector().namespace(), "slotgrid");
    }

    #[test]
    fn malformed_tags_are_dropped() {
        let c = MetricsCollector::new(&MetricsConfig {
            namespace: Some("canary".to_string()),
            tags: vec![
                "env=prod".to_string(),
                "team:infra".to_string(),
                "production".to_string(),
                "=nokey".to_string(),
            ],
            textfile: None,
        });
        assert_eq!(c.namespace(), "canary");
        assert_eq!(
            c.labels(),
            &[
                ("env".to_string(), "prod".to_string()),
                ("team".to_string(), "infra".to_string()),
            ]
        );
    }

    #[test]
    fn role_tag_is_dropped() {
        let c = MetricsCollector::new(&MetricsConfig {
            tags: vec!["role=web".to_string(), "env=prod".to_string()],
            ..Default::default()
        });
        assert_eq!(c.labels(), &[("env".to_string(), "prod".to_string())]);

        c.role_chosen("blue");
        let text = c.render();
        assert!(text.contains("slotgrid_role_assigned_total{role=\"blue\",env=\"prod\"} 1"));
        assert!(!text.contains("role=\"web\""));
    }

    #[test]
    fn flush_writes_textfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slotgrid.prom");
        let c = MetricsCollector::new(&MetricsConfig {
            textfile: Some(path.clone()),
            ..Default::default()
        });
        c.role_chosen("blue");
        c.flush();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("slotgrid_role_assigned_total{role=\"blue\"} 1"));
        assert!(!path.with_extension("prom.tmp").exists());
    }

    #[test]
    fn flush_to_unwritable_path_is_silent() {
        let c = MetricsCollector::new(&MetricsConfig {
            textfile: Some("/nonexistent/dir/slotgrid.prom".into()),
            ..Default::default()
        });
        c.role_error();
        c.flush();
        assert_eq!(c.snapshot().errors, 1);
    }
}
