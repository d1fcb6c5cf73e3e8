//! Storage layer for livecontrol.
//!
//! Two kinds of state live here:
//!
//! - **Metadata**: hubs and the shockers paired with them, persisted in `RocksDB`.
//!   The gateway reads this whenever a hub connects or is reconfigured.
//! - **Presence**: short-lived "hub is online" records with a TTL, see [`presence`].
//!
//! # Column families
//!
//! - `hubs`: hub records, keyed by `hub_id`
//! - `shockers`: shocker records, keyed by `shocker_id`
//! - `shockers_by_hub`: index for listing shockers by hub
//!
//! # Example
//!
//! ```no_run
//! use livecontrol_store::{RocksStore, Store};
//! use livecontrol_core::HubId;
//!
//! let store = RocksStore::open("/tmp/livecontrol-db").unwrap();
//!
//! let hub_id = HubId::generate();
//! let shockers = store.list_shockers_by_hub(&hub_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod presence;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use presence::{MemoryPresenceStore, PresenceRecord, PresenceStore};
pub use rocks::RocksStore;
pub use types::{Hub, Shocker};

use livecontrol_core::{HubId, ShockerId};

/// The storage trait defining all metadata operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    /// Insert or update a hub record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_hub(&self, hub: &Hub) -> Result<()>;

    /// Get a hub by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_hub(&self, hub_id: &HubId) -> Result<Option<Hub>>;

    /// Delete a hub and every shocker paired with it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the hub doesn't exist.
    fn delete_hub(&self, hub_id: &HubId) -> Result<()>;

    /// Insert or update a shocker record, maintaining the hub index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_shocker(&self, shocker: &Shocker) -> Result<()>;

    /// Get a shocker by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_shocker(&self, shocker_id: &ShockerId) -> Result<Option<Shocker>>;

    /// Delete a shocker by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the shocker doesn't exist.
    fn delete_shocker(&self, shocker_id: &ShockerId) -> Result<()>;

    /// List all shockers paired with a hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_shockers_by_hub(&self, hub_id: &HubId) -> Result<Vec<Shocker>>;
}
