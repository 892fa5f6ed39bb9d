//! LockStore — redb-backed check-and-set claims.
//!
//! Each claim is a JSON [`Claim`] record under its lock key. The store
//! supports both on-disk and in-memory backends (the latter for testing
//! and single-process runs).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use slotgrid_core::Roster;
use tracing::debug;

use crate::error::{LockError, LockResult};
use crate::locker::{Acquire, Locker};
use crate::tables::{CLAIMS, ROSTERS};

/// Convert any `Display` error into a `LockError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| LockError::$variant(e.to_string())
    };
}

/// A held lock key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub key: String,
    /// Free-form identity of the claimant (host, pid, pod name).
    pub holder: String,
    /// Unix seconds at acquisition.
    pub acquired_at: u64,
}

/// Thread-safe claim store backed by redb.
#[derive(Clone)]
pub struct LockStore {
    db: Arc<Database>,
    holder: String,
}

impl LockStore {
    /// Open (or create) a persistent lock store at the given path.
    pub fn open(path: &Path) -> LockResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self::from_db(db);
        store.ensure_tables()?;
        debug!(?path, "lock store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory lock store.
    pub fn open_in_memory() -> LockResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self::from_db(db);
        store.ensure_tables()?;
        debug!("in-memory lock store opened");
        Ok(store)
    }

    fn from_db(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            holder: format!("pid-{}", std::process::id()),
        }
    }

    /// Record claims made through this handle under `holder`.
    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    fn ensure_tables(&self) -> LockResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CLAIMS).map_err(map_err!(Table))?;
        txn.open_table(ROSTERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Claims ─────────────────────────────────────────────────────

    /// Claim `key` if nobody holds it. The lookup and the insert share
    /// one write transaction.
    pub fn try_claim(&self, key: &str) -> LockResult<Acquire> {
        let claim = Claim {
            key: key.to_string(),
            holder: self.holder.clone(),
            acquired_at: now_secs(),
        };
        let value = serde_json::to_vec(&claim).map_err(map_err!(Serialize))?;

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let outcome = {
            let mut table = txn.open_table(CLAIMS).map_err(map_err!(Table))?;
            let held = table.get(key).map_err(map_err!(Read))?.is_some();
            if held {
                Acquire::AlreadyHeld
            } else {
                table
                    .insert(key, value.as_slice())
                    .map_err(map_err!(Write))?;
                Acquire::Acquired
            }
        };
        match outcome {
            Acquire::Acquired => txn.commit().map_err(map_err!(Transaction))?,
            Acquire::AlreadyHeld => txn.abort().map_err(map_err!(Transaction))?,
        }
        debug!(%key, ?outcome, "claim attempted");
        Ok(outcome)
    }

    /// Get the claim on a key, if held.
    pub fn get_claim(&self, key: &str) -> LockResult<Option<Claim>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLAIMS).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let claim: Claim =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(claim))
            }
            None => Ok(None),
        }
    }

    /// List all claims whose key lives under `{namespace}/`.
    pub fn list_claims(&self, namespace: &str) -> LockResult<Vec<Claim>> {
        let prefix = format!("{namespace}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLAIMS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let claim: Claim =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(claim);
            }
        }
        Ok(results)
    }

    /// Release a single key. Returns true if it was held.
    pub fn release(&self, key: &str) -> LockResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(CLAIMS).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "claim released");
        Ok(existed)
    }

    /// Release every claim under `{namespace}/`. Returns number released.
    pub fn reset_namespace(&self, namespace: &str) -> LockResult<u32> {
        let prefix = format!("{namespace}/");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut count = 0u32;
        {
            let mut table = txn.open_table(CLAIMS).map_err(map_err!(Table))?;
            let keys: Vec<String> = table
                .iter()
                .map_err(map_err!(Read))?
                .filter_map(|entry| {
                    let (key, _) = entry.ok()?;
                    let k = key.value().to_string();
                    k.starts_with(&prefix).then_some(k)
                })
                .collect();
            for key in &keys {
                if table.remove(key.as_str()).map_err(map_err!(Write))?.is_some() {
                    count += 1;
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%namespace, count, "namespace reset");
        Ok(count)
    }

    // ── Rosters ────────────────────────────────────────────────────

    /// Store a roster under `name` so other processes can load it from
    /// the shared store instead of a local file.
    pub fn put_roster(&self, name: &str, roster: &Roster) -> LockResult<()> {
        let value = serde_json::to_vec(roster).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ROSTERS).map_err(map_err!(Table))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, entries = roster.len(), "roster stored");
        Ok(())
    }

    /// Load a stored roster by name.
    pub fn get_roster(&self, name: &str) -> LockResult<Option<Roster>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ROSTERS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let roster =
                    Roster::from_json_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(roster))
            }
            None => Ok(None),
        }
    }
}

impl Locker for LockStore {
    fn acquire(&self, key: &str) -> LockResult<Acquire> {
        self.try_claim(key)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
