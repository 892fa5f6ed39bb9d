//! Lock key derivation.

use sha2::{Digest, Sha256};
use slotgrid_core::SelectorConfig;

/// Bytes of the identifier digest kept in the key.
const DIGEST_BYTES: usize = 10;

/// Derive the lock key for one slot:
/// `{application}/{selection}/{digest}/{slot_index}`.
///
/// The digest is the first ten bytes of `sha256(identifier ‖ slot_index)`
/// in hex, which keeps keys path-safe whatever the identifier contains.
pub fn lock_key(config: &SelectorConfig, identifier: &str, slot_index: u32) -> String {
    let index = slot_index.to_string();
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hasher.update(index.as_bytes());
    let digest = hasher.finalize();

    format!(
        "{}/{}/{}/{}",
        config.application_name,
        config.selection_id,
        hex::encode(&digest[..DIGEST_BYTES]),
        index
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SelectorConfig {
        SelectorConfig::new("test-app", "test-id")
    }

    #[test]
    fn same_inputs_same_key() {
        assert_eq!(lock_key(&config(), "blue", 0), lock_key(&config(), "blue", 0));
    }

    #[test]
    fn slot_indices_get_distinct_keys() {
        let a = lock_key(&config(), "blue", 0);
        let b = lock_key(&config(), "blue", 1);
        assert_ne!(a, b);
        assert!(a.ends_with("/0"));
        assert!(b.ends_with("/1"));
    }

    #[test]
    fn key_is_namespaced() {
        let key = lock_key(&config(), "blue", 3);
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "test-app");
        assert_eq!(parts[1], "test-id");
        assert_eq!(parts[2].len(), DIGEST_BYTES * 2);
        assert_eq!(parts[3], "3");
    }

    #[test]
    fn selection_id_changes_key() {
        let other = SelectorConfig::new("test-app", "test-id-2");
        assert_ne!(lock_key(&config(), "blue", 0), lock_key(&other, "blue", 0));
    }

    #[test]
    fn identifier_with_slash_stays_one_segment() {
        let key = lock_key(&config(), "team/blue", 0);
        assert_eq!(key.split('/').count(), 4);
    }
}
