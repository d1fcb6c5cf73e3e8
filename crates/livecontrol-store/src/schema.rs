//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Hub records, keyed by `hub_id`.
    pub const HUBS: &str = "hubs";

    /// Shocker records, keyed by `shocker_id`.
    pub const SHOCKERS: &str = "shockers";

    /// Index: shockers by hub, keyed by `hub_id || shocker_id`.
    pub const SHOCKERS_BY_HUB: &str = "shockers_by_hub";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::HUBS, cf::SHOCKERS, cf::SHOCKERS_BY_HUB]
}
