//! Live viewers: clients watching a hub in real time.
//!
//! Viewers are told when the hub connects or disconnects, and receive a fresh
//! shocker list whenever the hub's configuration changes so they can
//! recompute what they are allowed to control.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use livecontrol_core::HubId;
use livecontrol_store::Shocker;
use parking_lot::RwLock;
use thiserror::Error;

/// Errors reported when notifying a viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The viewer's connection is gone.
    #[error("viewer connection closed")]
    Closed,

    /// Sending the notification failed.
    #[error("failed to notify viewer: {0}")]
    Send(String),
}

/// One connected viewer.
#[async_trait]
pub trait LiveViewer: Send + Sync {
    /// Tell the viewer whether the hub is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    async fn update_connected_state(&self, connected: bool) -> Result<(), ViewerError>;

    /// Push the hub's current shocker list.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    async fn update_permissions(&self, shockers: &[Shocker]) -> Result<(), ViewerError>;
}

/// Lookup of viewers subscribed to a hub.
pub trait ViewerRegistry: Send + Sync {
    /// All viewers currently watching `hub_id`.
    fn viewers(&self, hub_id: &HubId) -> Vec<Arc<dyn LiveViewer>>;
}

/// Notify every viewer of a hub about its connection state.
///
/// Delivery failures are logged and skipped; one broken viewer must not keep
/// the others from being told.
pub async fn broadcast_connected(registry: &dyn ViewerRegistry, hub_id: HubId, connected: bool) {
    for viewer in registry.viewers(&hub_id) {
        if let Err(e) = viewer.update_connected_state(connected).await {
            tracing::warn!(
                hub_id = %hub_id,
                connected,
                error = %e,
                "Failed to notify viewer of connection state"
            );
        }
    }
}

/// Push a shocker list to every viewer of a hub.
pub async fn broadcast_permissions(registry: &dyn ViewerRegistry, hub_id: HubId, shockers: &[Shocker]) {
    for viewer in registry.viewers(&hub_id) {
        if let Err(e) = viewer.update_permissions(shockers).await {
            tracing::warn!(hub_id = %hub_id, error = %e, "Failed to push permissions to viewer");
        }
    }
}

/// In-process viewer registry.
#[derive(Default)]
pub struct InMemoryViewerRegistry {
    viewers: RwLock<HashMap<HubId, Vec<Arc<dyn LiveViewer>>>>,
}

impl InMemoryViewerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a viewer to a hub.
    pub fn subscribe(&self, hub_id: HubId, viewer: Arc<dyn LiveViewer>) {
        self.viewers.write().entry(hub_id).or_default().push(viewer);
    }

    /// Remove a viewer from a hub. Returns true if it was subscribed.
    pub fn unsubscribe(&self, hub_id: &HubId, viewer: &Arc<dyn LiveViewer>) -> bool {
        let mut viewers = self.viewers.write();
        let Some(list) = viewers.get_mut(hub_id) else {
            return false;
        };

        let before = list.len();
        list.retain(|v| !std::ptr::addr_eq(Arc::as_ptr(v), Arc::as_ptr(viewer)));
        let removed = list.len() != before;

        if list.is_empty() {
            viewers.remove(hub_id);
        }
        removed
    }

    /// Number of viewers watching a hub.
    #[must_use]
    pub fn count(&self, hub_id: &HubId) -> usize {
        self.viewers.read().get(hub_id).map_or(0, Vec::len)
    }
}

impl ViewerRegistry for InMemoryViewerRegistry {
    fn viewers(&self, hub_id: &HubId) -> Vec<Arc<dyn LiveViewer>> {
        self.viewers.read().get(hub_id).cloned().unwrap_or_default()
    }
}
