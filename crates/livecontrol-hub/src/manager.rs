//! Registry of connected hubs.
//!
//! The manager is the only place that knows whether a hub is reachable from
//! this gateway. Every ingress path (live frames, bus commands, heartbeats)
//! looks the hub up here and gets a `*NotFound` result when it is not
//! connected.

use std::collections::HashMap;
use std::sync::Arc;

use livecontrol_core::{ControlType, HubId, ShockerId};
use livecontrol_store::{PresenceRecord, Store};
use parking_lot::RwLock;

use crate::controller::HubController;
use crate::error::Result;
use crate::lifetime::HubLifetime;
use crate::presence::PresenceTracker;
use crate::types::{ControlCommand, DeviceResult, FrameResult, HubConfig, OnlineResult};
use crate::viewers::{self, ViewerRegistry};

/// Owns the lifetime of every hub connected to this gateway.
pub struct HubLifetimeManager<S: Store> {
    store: Arc<S>,
    viewers: Arc<dyn ViewerRegistry>,
    presence: Arc<PresenceTracker>,
    config: HubConfig,
    lifetimes: RwLock<HashMap<HubId, Arc<HubLifetime<S>>>>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl<S: Store + 'static> HubLifetimeManager<S> {
    /// Create an empty manager.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        viewers: Arc<dyn ViewerRegistry>,
        presence: Arc<PresenceTracker>,
        config: HubConfig,
    ) -> Self {
        Self {
            store,
            viewers,
            presence,
            config,
            lifetimes: RwLock::new(HashMap::new()),
            connect_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The presence tracker shared by all lifetimes.
    #[must_use]
    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    /// Register a newly connected hub and start its control loop.
    ///
    /// An existing lifetime for the same hub is disposed first, so at most
    /// one loop ever drives a hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub's shockers cannot be loaded. Nothing is
    /// registered then, and disposing `controller` is left to the caller. If a
    /// previous lifetime was already torn down, viewers are told the hub is
    /// gone and its presence is cleared.
    pub async fn add_device_connection(
        &self,
        tps: u8,
        controller: Arc<dyn HubController>,
    ) -> Result<Arc<HubLifetime<S>>> {
        let hub_id = controller.hub_id();
        let _guard = self.connect_lock.lock().await;

        let previous = self.lifetimes.write().remove(&hub_id);
        let replaced = previous.is_some();
        if let Some(previous) = previous {
            tracing::info!(hub_id = %hub_id, "Hub reconnected, replacing existing lifetime");
            previous.dispose().await;
        }

        let lifetime = Arc::new(HubLifetime::new(
            controller,
            tps,
            Arc::clone(&self.store),
            Arc::clone(&self.viewers),
            Arc::clone(&self.presence),
            &self.config,
        ));
        if let Err(e) = lifetime.init() {
            if replaced {
                tracing::warn!(hub_id = %hub_id, error = %e, "Reconnect failed, hub is offline");
                self.mark_offline(hub_id).await;
            }
            return Err(e);
        }
        lifetime.start();

        self.lifetimes
            .write()
            .insert(hub_id, Arc::clone(&lifetime));
        tracing::info!(hub_id = %hub_id, tps = lifetime.timing().tps, "Hub connected");

        viewers::broadcast_connected(self.viewers.as_ref(), hub_id, true).await;
        Ok(lifetime)
    }

    /// Tear down the lifetime driven by `controller`.
    ///
    /// Only the lifetime registered for this very connection is removed; a
    /// stale connection closing after its hub already reconnected leaves the
    /// replacement alone. Calling this more than once is harmless.
    ///
    /// Serialised with [`HubLifetimeManager::add_device_connection`], so a
    /// reconnect of the same hub never lands between the viewer notification,
    /// the eviction and the presence update that belong to this disconnect.
    ///
    /// # Errors
    ///
    /// Returns an error if the presence record cannot be cleared.
    pub async fn remove_device_connection(&self, controller: &Arc<dyn HubController>) -> Result<()> {
        let hub_id = controller.hub_id();
        let _guard = self.connect_lock.lock().await;

        let current = self
            .lifetimes
            .read()
            .get(&hub_id)
            .is_some_and(|lifetime| lifetime.is_controlled_by(controller));
        if !current {
            tracing::debug!(hub_id = %hub_id, "Ignoring disconnect of a replaced connection");
            return Ok(());
        }

        viewers::broadcast_connected(self.viewers.as_ref(), hub_id, false).await;

        let removed = self.lifetimes.write().remove(&hub_id);
        let Some(lifetime) = removed else {
            return Ok(());
        };
        lifetime.dispose().await;
        self.presence.offline(&hub_id)?;
        tracing::info!(hub_id = %hub_id, "Hub disconnected");
        Ok(())
    }

    async fn mark_offline(&self, hub_id: HubId) {
        viewers::broadcast_connected(self.viewers.as_ref(), hub_id, false).await;
        if let Err(e) = self.presence.offline(&hub_id) {
            tracing::warn!(hub_id = %hub_id, error = %e, "Failed to clear presence");
        }
    }

    /// Look up the lifetime of a connected hub.
    #[must_use]
    pub fn get(&self, hub_id: &HubId) -> Option<Arc<HubLifetime<S>>> {
        self.lifetimes.read().get(hub_id).cloned()
    }

    /// Returns true if the hub is connected to this gateway.
    #[must_use]
    pub fn is_connected(&self, hub_id: &HubId) -> bool {
        self.lifetimes.read().contains_key(hub_id)
    }

    /// Ids of all hubs connected to this gateway.
    #[must_use]
    pub fn connected_hubs(&self) -> Vec<HubId> {
        let mut hubs: Vec<_> = self.lifetimes.read().keys().copied().collect();
        hubs.sort();
        hubs
    }

    /// Route a live control frame.
    pub fn receive_frame(
        &self,
        hub_id: &HubId,
        shocker_id: &ShockerId,
        command_type: ControlType,
        intensity: u8,
        tps: u8,
    ) -> FrameResult {
        match self.get(hub_id) {
            Some(lifetime) => lifetime.receive_frame(shocker_id, command_type, intensity, tps),
            None => FrameResult::DeviceNotFound,
        }
    }

    /// Reload a hub's shockers after its configuration changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn update_device(&self, hub_id: &HubId) -> Result<DeviceResult> {
        let Some(lifetime) = self.get(hub_id) else {
            return Ok(DeviceResult::DeviceNotFound);
        };
        lifetime.update_device().await?;
        Ok(DeviceResult::Success)
    }

    /// Route bus control commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller fails to send the batch.
    pub async fn control(&self, hub_id: &HubId, commands: &[ControlCommand]) -> Result<DeviceResult> {
        let Some(lifetime) = self.get(hub_id) else {
            return Ok(DeviceResult::DeviceNotFound);
        };
        lifetime.control(commands).await?;
        Ok(DeviceResult::Success)
    }

    /// Toggle a hub's captive portal.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller fails to send the instruction.
    pub async fn control_captive(&self, hub_id: &HubId, enabled: bool) -> Result<DeviceResult> {
        let Some(lifetime) = self.get(hub_id) else {
            return Ok(DeviceResult::DeviceNotFound);
        };
        lifetime.control_captive(enabled).await?;
        Ok(DeviceResult::Success)
    }

    /// Start a firmware install on a hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller fails to send the instruction.
    pub async fn ota_install(&self, hub_id: &HubId, version: &str) -> Result<DeviceResult> {
        let Some(lifetime) = self.get(hub_id) else {
            return Ok(DeviceResult::DeviceNotFound);
        };
        lifetime.ota_install(version).await?;
        Ok(DeviceResult::Success)
    }

    /// Apply a presence heartbeat from a hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the presence store fails.
    pub fn device_online(&self, hub_id: &HubId, record: PresenceRecord) -> Result<OnlineResult> {
        let Some(lifetime) = self.get(hub_id) else {
            return Ok(OnlineResult::DeviceNotFound);
        };
        lifetime.online(record)
    }

    /// Dispose every lifetime. Used on shutdown.
    pub async fn dispose_all(&self) {
        let _guard = self.connect_lock.lock().await;
        let lifetimes: Vec<_> = self.lifetimes.write().drain().collect();
        if lifetimes.is_empty() {
            return;
        }

        tracing::info!(count = lifetimes.len(), "Disposing all hub lifetimes");
        for (hub_id, lifetime) in lifetimes {
            lifetime.dispose().await;
            self.mark_offline(hub_id).await;
        }
    }
}
