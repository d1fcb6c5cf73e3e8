//! Presence tracking for connected hubs.
//!
//! Hubs send periodic heartbeats. Each one refreshes the hub's presence record
//! and its TTL, but an event is only broadcast when the hub first comes online
//! or when a field observers care about changes. Latency and signal strength
//! move on almost every heartbeat and would otherwise flood subscribers.

use std::sync::Arc;
use std::time::Duration;

use livecontrol_core::{HubId, UserId};
use livecontrol_store::{PresenceRecord, PresenceStore};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::types::OnlineResult;

/// What happened to a hub's presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEventKind {
    /// The hub came online.
    Online,
    /// Identity fields of an online hub changed.
    Updated,
    /// The hub went offline.
    Offline,
}

/// A presence change broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEvent {
    /// The hub concerned.
    pub hub_id: HubId,
    /// Owner of the hub.
    pub owner_id: UserId,
    /// What happened.
    pub kind: PresenceEventKind,
    /// The record as stored after the change, absent for `Offline`.
    pub record: Option<PresenceRecord>,
}

/// Applies heartbeats to the presence store and broadcasts changes.
pub struct PresenceTracker {
    store: Arc<dyn PresenceStore>,
    ttl: Duration,
    events: broadcast::Sender<PresenceEvent>,
}

impl PresenceTracker {
    /// Create a tracker writing to `store` with the given record TTL.
    #[must_use]
    pub fn new(store: Arc<dyn PresenceStore>, ttl: Duration, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self { store, ttl, events }
    }

    /// Subscribe to presence events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.events.subscribe()
    }

    /// Apply a heartbeat.
    ///
    /// # Errors
    ///
    /// Returns an error if the presence store fails.
    pub fn heartbeat(&self, record: PresenceRecord) -> Result<OnlineResult> {
        let kind = match self.store.get(&record.hub_id)? {
            None => Some(PresenceEventKind::Online),
            Some(existing) if existing.identity_differs(&record) => {
                Some(PresenceEventKind::Updated)
            }
            Some(_) => None,
        };

        // Always rewrite: volatile fields and the TTL are refreshed either way.
        self.store.put(record.clone(), self.ttl)?;

        let Some(kind) = kind else {
            tracing::trace!(hub_id = %record.hub_id, "Presence refreshed");
            return Ok(OnlineResult::Success);
        };

        tracing::debug!(hub_id = %record.hub_id, kind = ?kind, "Presence changed");
        self.publish(PresenceEvent {
            hub_id: record.hub_id,
            owner_id: record.owner_id,
            kind,
            record: Some(record),
        });
        Ok(OnlineResult::OnlineStateUpdated)
    }

    /// Drop a hub's presence record and broadcast that it went offline.
    ///
    /// Nothing is broadcast if the hub had no live record.
    ///
    /// # Errors
    ///
    /// Returns an error if the presence store fails.
    pub fn offline(&self, hub_id: &HubId) -> Result<()> {
        if let Some(record) = self.store.remove(hub_id)? {
            self.publish(PresenceEvent {
                hub_id: *hub_id,
                owner_id: record.owner_id,
                kind: PresenceEventKind::Offline,
                record: None,
            });
        }
        Ok(())
    }

    fn publish(&self, event: PresenceEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
