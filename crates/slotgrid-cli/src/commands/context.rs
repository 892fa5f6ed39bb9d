//! Resolves config file, flags, roster, and lock store for a command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use slotgrid_core::{MetricsConfig, Roster, SelectorConfig, SlotgridConfig, parse_duration};
use slotgrid_lock::{LockStore, Locker};
use slotgrid_metrics::MetricsCollector;
use slotgrid_selector::Selector;
use tracing::debug;

use crate::GlobalOpts;

/// Everything a command needs, with flags applied over the config file.
pub struct Context {
    pub file: SlotgridConfig,
    pub selector: SelectorConfig,
    pub metrics: MetricsConfig,
    pub lock_path: Option<PathBuf>,
    pub roster_path: Option<PathBuf>,
    pub stored_roster: Option<String>,
    pub seed: Option<u64>,
}

impl Context {
    pub fn load(opts: &GlobalOpts) -> anyhow::Result<Self> {
        let file = match &opts.config {
            Some(path) => SlotgridConfig::from_file(path)?,
            None => SlotgridConfig::default(),
        };

        let mut selector = file.selector_config()?;
        if let Some(name) = &opts.app_name {
            selector.application_name = name.clone();
        }
        if let Some(id) = &opts.selection_id {
            selector.selection_id = id.clone();
        }
        if let Some(delay) = &opts.lock_delay {
            selector.lock_delay = parse_duration(delay)?;
        }
        if opts.debug {
            selector.debug_mode = true;
        }

        let mut metrics = file.metrics.clone();
        if let Some(textfile) = &opts.metrics_textfile {
            metrics.textfile = Some(textfile.clone());
        }
        if let Some(namespace) = &opts.metrics_namespace {
            metrics.namespace = Some(namespace.clone());
        }
        if let Some(tags) = &opts.metrics_tags {
            metrics.tags = tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }

        let lock_path = opts.lock_path.clone().or_else(|| file.lock.path.clone());
        debug!(
            namespace = %selector.namespace(),
            ?lock_path,
            lock_delay = ?selector.lock_delay,
            "context resolved"
        );

        Ok(Self {
            selector,
            metrics,
            lock_path,
            roster_path: opts.roster.clone(),
            stored_roster: opts.stored_roster.clone(),
            seed: opts.seed,
            file,
        })
    }

    /// Open the shared lock store. Claims are recorded under
    /// `$HOSTNAME-<pid>` when the hostname is known.
    pub fn open_store(&self) -> anyhow::Result<LockStore> {
        let path = self
            .lock_path
            .as_deref()
            .context("no lock store configured; pass --lock-path or set [lock].path")?;
        let store = LockStore::open(path)
            .with_context(|| format!("opening lock store {}", path.display()))?;
        Ok(match std::env::var("HOSTNAME") {
            Ok(host) if !host.is_empty() => {
                store.with_holder(format!("{host}-{}", std::process::id()))
            }
            _ => store,
        })
    }

    /// Resolve the roster: `--roster` file, then `--stored-roster` from
    /// the lock store, then inline `[[roles]]` in the config file.
    pub fn roster(&self, store: Option<&LockStore>) -> anyhow::Result<Roster> {
        if let Some(path) = &self.roster_path {
            return Ok(slotgrid_core::load_roster(path)?);
        }
        if let Some(name) = &self.stored_roster {
            let store = store.context("--stored-roster needs a reachable lock store")?;
            return store
                .get_roster(name)?
                .with_context(|| format!("no roster stored under {name}"));
        }
        self.file
            .roster()?
            .context("no roster configured; pass --roster, --stored-roster, or add [[roles]]")
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        Arc::new(MetricsCollector::new(&self.metrics))
    }

    pub fn selector<L: Locker>(&self, roster: Roster, locker: L) -> Selector<L> {
        let config = self.selector.clone();
        match self.seed {
            Some(seed) => Selector::seeded(config, roster, locker, seed),
            None => Selector::new(config, roster, locker),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use slotgrid_core::Entry;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const CONFIG: &str = r#"
[selection]
application_name = "canary"
selection_id = "7"
lock_delay = "1s"

[metrics]
namespace = "fleet"
tags = ["env=staging"]

[[roles]]
identifier = "blue"
weight = 2
"#;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_file(&dir, "slotgrid.toml", CONFIG);
        let opts = GlobalOpts {
            config: Some(config),
            selection_id: Some("8".to_string()),
            lock_delay: Some("100ms".to_string()),
            debug: true,
            metrics_tags: Some("env=prod, team=infra,".to_string()),
            ..Default::default()
        };
        let ctx = Context::load(&opts).unwrap();
        assert_eq!(ctx.selector.application_name, "canary");
        assert_eq!(ctx.selector.selection_id, "8");
        assert_eq!(ctx.selector.lock_delay, Duration::from_millis(100));
        assert!(ctx.selector.debug_mode);
        assert_eq!(ctx.metrics.namespace.as_deref(), Some("fleet"));
        assert_eq!(ctx.metrics.tags, vec!["env=prod", "team=infra"]);
    }

    #[test]
    fn defaults_without_config() {
        let ctx = Context::load(&GlobalOpts::default()).unwrap();
        assert_eq!(ctx.selector, SelectorConfig::default());
        assert!(ctx.lock_path.is_none());
        assert!(ctx.open_store().is_err());
        assert!(ctx.roster(None).is_err());
    }

    #[test]
    fn roster_file_wins_over_inline_roles() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_file(&dir, "slotgrid.toml", CONFIG);
        let roster = write_file(&dir, "roster.json", r#"[{"identifier": "green", "weight": 1}]"#);

        let inline = Context::load(&GlobalOpts {
            config: Some(config.clone()),
            ..Default::default()
        })
        .unwrap();
        assert!(inline.roster(None).unwrap().get("blue").is_some());

        let from_file = Context::load(&GlobalOpts {
            config: Some(config),
            roster: Some(roster),
            ..Default::default()
        })
        .unwrap();
        let loaded = from_file.roster(None).unwrap();
        assert!(loaded.get("green").is_some());
        assert!(loaded.get("blue").is_none());
    }

    #[test]
    fn stored_roster_comes_from_lock_store() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(&GlobalOpts {
            lock_path: Some(dir.path().join("locks.redb")),
            stored_roster: Some("canary".to_string()),
            ..Default::default()
        })
        .unwrap();
        let store = ctx.open_store().unwrap();

        assert!(ctx.roster(Some(&store)).is_err());
        assert!(ctx.roster(None).is_err());

        let roster = Roster::new(vec![Entry::new("blue", 2)]).unwrap();
        store.put_roster("canary", &roster).unwrap();
        assert_eq!(ctx.roster(Some(&store)).unwrap(), roster);
    }

    #[test]
    fn invalid_lock_delay_flag_fails() {
        let opts = GlobalOpts {
            lock_delay: Some("later".to_string()),
            ..Default::default()
        };
        assert!(Context::load(&opts).is_err());
    }
}
