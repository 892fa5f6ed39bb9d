//! Shared types used across SlotGrid crates.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// One selectable role and the number of claims it may satisfy.
///
/// Accepts the legacy `role_name` / `num` field names when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(alias = "role_name")]
    pub identifier: String,
    #[serde(alias = "num")]
    pub weight: u32,
    /// Opaque payload handed to whoever wins this role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<serde_json::Value>,
}

impl Entry {
    pub fn new(identifier: impl Into<String>, weight: u32) -> Self {
        Self {
            identifier: identifier.into(),
            weight,
            definition: None,
        }
    }

    pub fn with_definition(mut self, definition: serde_json::Value) -> Self {
        self.definition = Some(definition);
        self
    }
}

/// An ordered, validated sequence of entries.
///
/// Identifiers are non-empty and unique. Entries with weight zero are
/// kept but contribute no claimable capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct Roster {
    entries: Vec<Entry>,
}

impl Roster {
    /// Validate and build a roster.
    pub fn new(entries: Vec<Entry>) -> CoreResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.identifier.trim().is_empty() {
                return Err(CoreError::Roster("entry identifier is empty".to_string()));
            }
            if !seen.insert(entry.identifier.as_str()) {
                return Err(CoreError::Roster(format!(
                    "duplicate identifier: {}",
                    entry.identifier
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of entries.
    pub fn from_json_slice(bytes: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::Roster(e.to_string()))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total claimable capacity, the sum of all weights.
    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.weight)).sum()
    }

    pub fn get(&self, identifier: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.identifier == identifier)
    }
}

impl TryFrom<Vec<Entry>> for Roster {
    type Error = CoreError;

    fn try_from(entries: Vec<Entry>) -> CoreResult<Self> {
        Self::new(entries)
    }
}

impl From<Roster> for Vec<Entry> {
    fn from(roster: Roster) -> Self {
        roster.entries
    }
}

/// Process-local settings that namespace one selection run.
///
/// Two processes sharing `application_name` and `selection_id` contend
/// for the same lock keys; bumping `selection_id` starts a fresh round.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    pub application_name: String,
    pub selection_id: String,
    /// Pause after each lock attempt that found the key already held.
    pub lock_delay: Duration,
    /// Trace every lock attempt.
    pub debug_mode: bool,
}

impl SelectorConfig {
    pub fn new(application_name: impl Into<String>, selection_id: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            selection_id: selection_id.into(),
            ..Default::default()
        }
    }

    /// The `{application_name}/{selection_id}` prefix shared by every lock key.
    pub fn namespace(&self) -> String {
        format!("{}/{}", self.application_name, self.selection_id)
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            application_name: "app".to_string(),
            selection_id: "1".to_string(),
            lock_delay: Duration::ZERO,
            debug_mode: false,
        }
    }
}

/// Metrics export settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prefix for every exported metric name.
    pub namespace: Option<String>,
    /// `key=value` labels attached to every sample.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Prometheus textfile written on flush.
    pub textfile: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_rejects_duplicate_identifiers() {
        let err = Roster::new(vec![Entry::new("blue", 1), Entry::new("blue", 2)]).unwrap_err();
        assert!(err.to_string().contains("duplicate identifier: blue"));
    }

    #[test]
    fn roster_rejects_empty_identifier() {
        assert!(Roster::new(vec![Entry::new("  ", 1)]).is_err());
    }

    #[test]
    fn roster_total_weight_skips_nothing() {
        let roster = Roster::new(vec![
            Entry::new("a", 1),
            Entry::new("b", 0),
            Entry::new("c", 3),
        ])
        .unwrap();
        assert_eq!(roster.total_weight(), 4);
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn roster_parses_legacy_field_names() {
        let json = br#"[{"role_name": "blue", "num": 2}, {"identifier": "green", "weight": 1}]"#;
        let roster = Roster::from_json_slice(json).unwrap();
        assert_eq!(roster.entries()[0], Entry::new("blue", 2));
        assert_eq!(roster.get("green").map(|e| e.weight), Some(1));
    }

    #[test]
    fn roster_rejects_negative_weight() {
        let json = br#"[{"identifier": "blue", "weight": -1}]"#;
        assert!(Roster::from_json_slice(json).is_err());
    }

    #[test]
    fn roster_validation_runs_on_deserialize() {
        let json = br#"[{"identifier": "a", "weight": 1}, {"identifier": "a", "weight": 1}]"#;
        assert!(Roster::from_json_slice(json).is_err());
    }

    #[test]
    fn entry_definition_survives_serialization() {
        let entry = Entry::new("blue", 1).with_definition(serde_json::json!({"image": "blue:1"}));
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn selector_config_namespace() {
        let cfg = SelectorConfig::new("canary", "42");
        assert_eq!(cfg.namespace(), "canary/42");
        assert_eq!(cfg.lock_delay, Duration::ZERO);
    }
}
