//! slotgrid.toml configuration parser and roster loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::types::{Entry, MetricsConfig, Roster, SelectorConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotgridConfig {
    #[serde(default)]
    pub selection: SelectionSection,
    #[serde(default)]
    pub lock: LockSection,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub roles: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSection {
    pub application_name: Option<String>,
    pub selection_id: Option<String>,
    /// Duration string such as "250ms", "2s" or "1m".
    pub lock_delay: Option<String>,
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockSection {
    /// redb file shared by every contending process.
    pub path: Option<PathBuf>,
}

/// Roster file in TOML form: a list of `[[roles]]` tables.
#[derive(Debug, Deserialize)]
struct RosterFile {
    roles: Vec<Entry>,
}

impl SlotgridConfig {
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = read(path)?;
        let config: SlotgridConfig =
            toml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))?;
        debug!(?path, roles = config.roles.len(), "config loaded");
        Ok(config)
    }

    /// Selector settings with defaults filled in for anything unset.
    pub fn selector_config(&self) -> CoreResult<SelectorConfig> {
        let defaults = SelectorConfig::default();
        let lock_delay = match &self.selection.lock_delay {
            Some(s) => parse_duration(s)?,
            None => defaults.lock_delay,
        };
        Ok(SelectorConfig {
            application_name: self
                .selection
                .application_name
                .clone()
                .unwrap_or(defaults.application_name),
            selection_id: self
                .selection
                .selection_id
                .clone()
                .unwrap_or(defaults.selection_id),
            lock_delay,
            debug_mode: self.selection.debug.unwrap_or(defaults.debug_mode),
        })
    }

    /// The inline `[[roles]]` roster, if any roles are configured.
    pub fn roster(&self) -> CoreResult<Option<Roster>> {
        if self.roles.is_empty() {
            return Ok(None);
        }
        Roster::new(self.roles.clone()).map(Some)
    }
}

/// Load a roster from a `.toml` file (`[[roles]]` tables) or a JSON array.
pub fn load_roster(path: &Path) -> CoreResult<Roster> {
    let content = read(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let roster = if is_toml {
        let file: RosterFile =
            toml::from_str(&content).map_err(|e| CoreError::Roster(e.to_string()))?;
        Roster::new(file.roles)?
    } else {
        Roster::from_json_slice(content.as_bytes())?
    };
    debug!(?path, entries = roster.len(), "roster loaded");
    Ok(roster)
}

/// Parse a duration string like "5s", "500ms", "1m", or bare seconds.
pub fn parse_duration(s: &str) -> CoreResult<Duration> {
    let s = s.trim();
    let parsed = if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.ok_or_else(|| CoreError::Duration(s.to_string()))
}

fn read(path: &Path) -> CoreResult<String> {
    std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parse_minimal() {
        let config: SlotgridConfig = toml::from_str("").unwrap();
        let selector = config.selector_config().unwrap();
        assert_eq!(selector, SelectorConfig::default());
        assert!(config.roster().unwrap().is_none());
    }

    #[test]
    fn parse_full() {
        let toml_str = r#"
[selection]
application_name = "canary"
selection_id = "release-7"
lock_delay = "250ms"
debug = true

[lock]
path = "/tmp/locks.redb"

[metrics]
namespace = "slotgrid"
tags = ["env=prod"]

[[roles]]
identifier = "blue"
weight = 2
definition = { image = "blue:latest" }

[[roles]]
identifier = "green"
weight = 1
"#;
        let config: SlotgridConfig = toml::from_str(toml_str).unwrap();
        let selector = config.selector_config().unwrap();
        assert_eq!(selector.application_name, "canary");
        assert_eq!(selector.selection_id, "release-7");
        assert_eq!(selector.lock_delay, Duration::from_millis(250));
        assert!(selector.debug_mode);
        assert_eq!(config.lock.path, Some(PathBuf::from("/tmp/locks.redb")));
        assert_eq!(config.metrics.tags, vec!["env=prod".to_string()]);

        let roster = config.roster().unwrap().unwrap();
        assert_eq!(roster.total_weight(), 3);
        let blue = roster.get("blue").unwrap();
        assert_eq!(
            blue.definition,
            Some(serde_json::json!({"image": "blue:latest"}))
        );
    }

    #[test]
    fn invalid_lock_delay_is_rejected() {
        let config: SlotgridConfig = toml::from_str("[selection]\nlock_delay = \"soon\"").unwrap();
        assert!(matches!(
            config.selector_config(),
            Err(CoreError::Duration(_))
        ));
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert!(parse_duration("abc").is_err());
        assert!(matches!(
            parse_duration("999999999999999999m"),
            Err(CoreError::Duration(_))
        ));
        assert_eq!(
            parse_duration("307445734561825860m").unwrap(),
            Duration::from_secs(307445734561825860 * 60)
        );
    }

    #[test]
    fn load_roster_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"[{"role_name": "a", "num": 1}, {"role_name": "b", "num": 3}]"#)
            .unwrap();
        let roster = load_roster(file.path()).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.total_weight(), 4);
    }

    #[test]
    fn load_roster_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[[roles]]\nidentifier = \"a\"\nweight = 2\n")
            .unwrap();
        let roster = load_roster(file.path()).unwrap();
        assert_eq!(roster.entries()[0], Entry::new("a", 2));
    }

    #[test]
    fn load_roster_missing_file() {
        let err = load_roster(Path::new("/nonexistent/roster.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
