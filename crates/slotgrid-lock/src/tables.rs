//! redb table definitions for the lock store.

use redb::TableDefinition;

/// Claim records keyed by full lock key.
pub const CLAIMS: TableDefinition<&str, &[u8]> = TableDefinition::new("claims");

/// JSON-encoded rosters keyed by an operator-chosen name.
pub const ROSTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("rosters");
