//! TTL-backed presence records.
//!
//! A hub's presence record says "this hub is online right now, through this
//! gateway". Records expire on their own unless the hub keeps sending
//! heartbeats, so a gateway that dies without cleaning up does not leave hubs
//! marked online forever.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use livecontrol_core::{HubId, UserId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Presence information about a connected hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// The hub this record describes.
    pub hub_id: HubId,
    /// Owner of the hub.
    pub owner_id: UserId,
    /// Firmware version reported by the hub.
    pub firmware_version: String,
    /// Identity of the gateway instance holding the connection.
    pub gateway: String,
    /// When the current connection was established.
    pub connected_at: DateTime<Utc>,
    /// User agent of the hub's websocket client, if reported.
    pub user_agent: Option<String>,
    /// When the hub last booted.
    pub booted_at: DateTime<Utc>,
    /// Last measured round-trip latency.
    pub latency_ms: Option<u64>,
    /// Last reported signal strength.
    pub rssi: Option<i32>,
}

impl PresenceRecord {
    /// Returns true if the fields observers care about differ.
    ///
    /// Boot time, latency and signal strength change on nearly every heartbeat
    /// and are excluded.
    #[must_use]
    pub fn identity_differs(&self, other: &Self) -> bool {
        self.firmware_version != other.firmware_version
            || self.gateway != other.gateway
            || self.connected_at != other.connected_at
            || self.user_agent != other.user_agent
    }
}

/// Storage for presence records with per-record time-to-live.
pub trait PresenceStore: Send + Sync {
    /// Get the live record for a hub, ignoring expired ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn get(&self, hub_id: &HubId) -> Result<Option<PresenceRecord>>;

    /// Insert or replace a record, resetting its TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn put(&self, record: PresenceRecord, ttl: Duration) -> Result<()>;

    /// Remove a record. Returns the removed record if it was still live.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn remove(&self, hub_id: &HubId) -> Result<Option<PresenceRecord>>;
}

#[derive(Debug, Clone)]
struct Entry {
    record: PresenceRecord,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// In-process presence store.
///
/// Expiry is evaluated lazily on read; call [`MemoryPresenceStore::purge_expired`]
/// periodically to reclaim memory.
#[derive(Debug, Default)]
pub struct MemoryPresenceStore {
    entries: RwLock<HashMap<HubId, Entry>>,
}

impl MemoryPresenceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// Returns true if no live record exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PresenceStore for MemoryPresenceStore {
    fn get(&self, hub_id: &HubId) -> Result<Option<PresenceRecord>> {
        let now = Utc::now();
        Ok(self
            .entries
            .read()
            .get(hub_id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.record.clone()))
    }

    fn put(&self, record: PresenceRecord, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365));
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries
            .write()
            .insert(record.hub_id, Entry { record, expires_at });
        Ok(())
    }

    fn remove(&self, hub_id: &HubId) -> Result<Option<PresenceRecord>> {
        let now = Utc::now();
        Ok(self
            .entries
            .write()
            .remove(hub_id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PresenceRecord {
        PresenceRecord {
            hub_id: HubId::generate(),
            owner_id: UserId::generate(),
            firmware_version: "1.2.0".to_string(),
            gateway: "gw-1".to_string(),
            connected_at: Utc::now(),
            user_agent: Some("hub-fw/1.2.0".to_string()),
            booted_at: Utc::now(),
            latency_ms: Some(20),
            rssi: Some(-60),
        }
    }

    #[test]
    fn put_and_get() {
        let store = MemoryPresenceStore::new();
        let rec = record();

        store.put(rec.clone(), Duration::from_secs(60)).unwrap();

        assert_eq!(store.get(&rec.hub_id).unwrap(), Some(rec));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn expired_records_are_invisible() {
        let store = MemoryPresenceStore::new();
        let rec = record();

        store.put(rec.clone(), Duration::ZERO).unwrap();

        assert!(store.get(&rec.hub_id).unwrap().is_none());
        assert!(store.is_empty());
        assert_eq!(store.purge_expired(), 1);
    }

    #[test]
    fn remove_returns_live_record() {
        let store = MemoryPresenceStore::new();
        let rec = record();
        store.put(rec.clone(), Duration::from_secs(60)).unwrap();

        assert_eq!(store.remove(&rec.hub_id).unwrap(), Some(rec.clone()));
        assert!(store.remove(&rec.hub_id).unwrap().is_none());
    }

    #[test]
    fn volatile_fields_do_not_change_identity() {
        let a = record();
        let mut b = a.clone();
        b.latency_ms = Some(300);
        b.rssi = Some(-90);
        b.booted_at = Utc::now();
        assert!(!a.identity_differs(&b));

        b.firmware_version = "1.3.0".to_string();
        assert!(a.identity_differs(&b));
    }
}
