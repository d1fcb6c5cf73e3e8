//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use livecontrol_core::{HubId, ShockerId};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{Hub, Shocker};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Collect the shocker ids indexed under a hub.
    fn shocker_ids_by_hub(&self, hub_id: &HubId) -> Result<Vec<ShockerId>> {
        let cf_by_hub = self.cf(cf::SHOCKERS_BY_HUB)?;
        let prefix = keys::hub_prefix(hub_id);

        let mut ids = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf_by_hub, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            ids.push(keys::extract_shocker_id(&key)?);
        }

        Ok(ids)
    }
}

impl Store for RocksStore {
    fn put_hub(&self, hub: &Hub) -> Result<()> {
        let cf = self.cf(cf::HUBS)?;
        let value = Self::serialize(hub)?;

        self.db
            .put_cf(&cf, keys::hub_key(&hub.hub_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_hub(&self, hub_id: &HubId) -> Result<Option<Hub>> {
        let cf = self.cf(cf::HUBS)?;

        self.db
            .get_cf(&cf, keys::hub_key(hub_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_hub(&self, hub_id: &HubId) -> Result<()> {
        let cf_hubs = self.cf(cf::HUBS)?;
        let cf_shockers = self.cf(cf::SHOCKERS)?;
        let cf_by_hub = self.cf(cf::SHOCKERS_BY_HUB)?;

        if self.get_hub(hub_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let mut batch = WriteBatch::default();
        for shocker_id in self.shocker_ids_by_hub(hub_id)? {
            batch.delete_cf(&cf_shockers, keys::shocker_key(&shocker_id));
            batch.delete_cf(&cf_by_hub, keys::hub_shocker_key(hub_id, &shocker_id));
        }
        batch.delete_cf(&cf_hubs, keys::hub_key(hub_id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn put_shocker(&self, shocker: &Shocker) -> Result<()> {
        let cf_shockers = self.cf(cf::SHOCKERS)?;
        let cf_by_hub = self.cf(cf::SHOCKERS_BY_HUB)?;

        let previous_hub = self.get_shocker(&shocker.shocker_id)?.map(|s| s.hub_id);
        let value = Self::serialize(shocker)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_shockers, keys::shocker_key(&shocker.shocker_id), value);

        // Re-pairing a shocker to another hub moves its index entry.
        if let Some(old_hub) = previous_hub {
            if old_hub != shocker.hub_id {
                batch.delete_cf(
                    &cf_by_hub,
                    keys::hub_shocker_key(&old_hub, &shocker.shocker_id),
                );
            }
        }
        batch.put_cf(
            &cf_by_hub,
            keys::hub_shocker_key(&shocker.hub_id, &shocker.shocker_id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_shocker(&self, shocker_id: &ShockerId) -> Result<Option<Shocker>> {
        let cf = self.cf(cf::SHOCKERS)?;

        self.db
            .get_cf(&cf, keys::shocker_key(shocker_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_shocker(&self, shocker_id: &ShockerId) -> Result<()> {
        let cf_shockers = self.cf(cf::SHOCKERS)?;
        let cf_by_hub = self.cf(cf::SHOCKERS_BY_HUB)?;

        let shocker = self.get_shocker(shocker_id)?.ok_or(StoreError::NotFound)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_shockers, keys::shocker_key(shocker_id));
        batch.delete_cf(&cf_by_hub, keys::hub_shocker_key(&shocker.hub_id, shocker_id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_shockers_by_hub(&self, hub_id: &HubId) -> Result<Vec<Shocker>> {
        let mut shockers = Vec::new();
        for shocker_id in self.shocker_ids_by_hub(hub_id)? {
            if let Some(shocker) = self.get_shocker(&shocker_id)? {
                shockers.push(shocker);
            } else {
                tracing::warn!(
                    hub_id = %hub_id,
                    shocker_id = %shocker_id,
                    "Dangling hub index entry"
                );
            }
        }
        Ok(shockers)
    }
}
