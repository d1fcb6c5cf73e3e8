//! The runtime of one connected hub.
//!
//! A `HubLifetime` exists for exactly as long as its hub's connection. It owns
//! the hub's shocker states and runs a fixed-rate loop that keeps re-sending
//! every active command, so that a lost radio packet is covered by the next
//! transmission.
//!
//! # Timing
//!
//! ```text
//! tps = 10                wait_between_ticks = 100ms
//!                         command_duration   = 250ms
//!
//! tick:    0ms      100ms     200ms     300ms
//! sent:    |=========|====|====|====|
//!                    |=========|====|====|
//!                              |=========|
//! ```
//!
//! Each transmitted command lasts two and a half ticks, so consecutive
//! transmissions overlap and a single missing one is not noticeable.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use livecontrol_core::{ControlType, HubId, ShockerId};
use livecontrol_store::{PresenceRecord, Shocker, Store};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::controller::HubController;
use crate::error::Result;
use crate::presence::PresenceTracker;
use crate::shocker_state::{active_window, ShockerState};
use crate::types::{ControlCommand, FrameResult, HubConfig, OnlineResult};
use crate::viewers::{self, ViewerRegistry};

/// Lowest supported tick rate.
pub const MIN_TPS: u8 = 1;

/// Highest supported tick rate.
pub const MAX_TPS: u8 = 10;

type ShockerMap = HashMap<ShockerId, Mutex<ShockerState>>;

/// Loop timing derived from the hub's tick rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTiming {
    /// Ticks per second, clamped to `MIN_TPS..=MAX_TPS`.
    pub tps: u8,
    /// Pause between two loop iterations.
    pub wait_between_ticks: Duration,
    /// Duration put on every command the loop transmits, in milliseconds.
    pub command_duration_ms: u16,
}

impl TickTiming {
    /// Derive timing for a tick rate.
    #[must_use]
    pub fn new(tps: u8) -> Self {
        let tps = tps.clamp(MIN_TPS, MAX_TPS);
        let wait_ms = 1_000 / u16::from(tps);
        Self {
            tps,
            wait_between_ticks: Duration::from_millis(u64::from(wait_ms)),
            command_duration_ms: wait_ms * 5 / 2,
        }
    }
}

/// Runtime state and control loop for one connected hub.
pub struct HubLifetime<S: Store> {
    hub_id: HubId,
    controller: Arc<dyn HubController>,
    store: Arc<S>,
    viewers: Arc<dyn ViewerRegistry>,
    presence: Arc<PresenceTracker>,
    timing: TickTiming,
    min_active_window: chrono::Duration,
    shockers: RwLock<Arc<ShockerMap>>,
    cancel: CancellationToken,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl<S: Store + 'static> HubLifetime<S> {
    /// Create a lifetime for the hub behind `controller`.
    ///
    /// The lifetime starts with no shockers; call [`HubLifetime::init`] and
    /// then [`HubLifetime::start`].
    #[must_use]
    pub fn new(
        controller: Arc<dyn HubController>,
        tps: u8,
        store: Arc<S>,
        viewers: Arc<dyn ViewerRegistry>,
        presence: Arc<PresenceTracker>,
        config: &HubConfig,
    ) -> Self {
        let min_active_window_ms = i64::try_from(config.min_active_window_ms).unwrap_or(i64::MAX);
        Self {
            hub_id: controller.hub_id(),
            controller,
            store,
            viewers,
            presence,
            timing: TickTiming::new(tps),
            min_active_window: chrono::Duration::milliseconds(min_active_window_ms),
            shockers: RwLock::new(Arc::new(HashMap::new())),
            cancel: CancellationToken::new(),
            loop_handle: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// The hub this lifetime belongs to.
    #[must_use]
    pub const fn hub_id(&self) -> HubId {
        self.hub_id
    }

    /// Loop timing in effect.
    #[must_use]
    pub const fn timing(&self) -> TickTiming {
        self.timing
    }

    /// Returns true if `controller` is the connection this lifetime drives.
    #[must_use]
    pub fn is_controlled_by(&self, controller: &Arc<dyn HubController>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.controller), Arc::as_ptr(controller))
    }

    /// Returns true once [`HubLifetime::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Copy of a shocker's current state.
    #[must_use]
    pub fn shocker_state(&self, shocker_id: &ShockerId) -> Option<ShockerState> {
        self.snapshot().get(shocker_id).map(|state| state.lock().clone())
    }

    /// Ids of all shockers currently loaded.
    #[must_use]
    pub fn shocker_ids(&self) -> Vec<ShockerId> {
        self.snapshot().keys().copied().collect()
    }

    fn snapshot(&self) -> Arc<ShockerMap> {
        Arc::clone(&self.shockers.read())
    }

    /// Load the hub's shockers from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails; no state is changed then.
    pub fn init(&self) -> Result<()> {
        let shockers = self.load_shockers()?;
        tracing::debug!(
            hub_id = %self.hub_id,
            shockers = shockers.len(),
            "Loaded hub shockers"
        );
        Ok(())
    }

    /// Query the store and swap in a fresh shocker map.
    ///
    /// The map is only replaced once the query succeeded.
    fn load_shockers(&self) -> Result<Vec<Shocker>> {
        let shockers = self.store.list_shockers_by_hub(&self.hub_id)?;
        let map: ShockerMap = shockers
            .iter()
            .map(|shocker| (shocker.shocker_id, Mutex::new(ShockerState::new(shocker))))
            .collect();
        *self.shockers.write() = Arc::new(map);
        Ok(shockers)
    }

    /// Spawn the control loop.
    ///
    /// Calling this more than once has no effect.
    pub fn start(self: &Arc<Self>) {
        let mut handle = self.loop_handle.lock();
        if handle.is_some() || self.cancel.is_cancelled() {
            return;
        }

        let weak = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        let wait = self.timing.wait_between_ticks;
        let hub_id = self.hub_id;

        *handle = Some(tokio::spawn(run_loop(weak, cancel, wait, hub_id)));
        tracing::debug!(hub_id = %hub_id, tps = self.timing.tps, "Started hub control loop");
    }

    /// One loop iteration: re-send every active, non-held shocker.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller fails to send the batch.
    pub async fn update(&self) -> Result<()> {
        let now = Utc::now();
        let duration_ms = self.timing.command_duration_ms;

        let commands: Vec<_> = self
            .snapshot()
            .values()
            .filter_map(|state| {
                let state = state.lock();
                let command = state
                    .should_transmit(now)
                    .then(|| state.command(duration_ms));
                command
            })
            .collect();

        if commands.is_empty() {
            return Ok(());
        }

        self.controller.control(commands).await?;
        Ok(())
    }

    /// Apply a live control frame.
    ///
    /// `tps` is the sender's own frame rate; the command stays active for about
    /// two and a half of the sender's frames.
    pub fn receive_frame(
        &self,
        shocker_id: &ShockerId,
        command_type: ControlType,
        intensity: u8,
        tps: u8,
    ) -> FrameResult {
        let shockers = self.snapshot();
        let Some(state) = shockers.get(shocker_id) else {
            return FrameResult::ShockerNotFound;
        };

        let mut state = state.lock();
        if state.paused {
            return FrameResult::ShockerPaused;
        }

        let active_for = active_window(tps, self.min_active_window);
        match state.apply_frame(command_type, intensity, active_for, Utc::now()) {
            Ok(()) => FrameResult::Success,
            Err(until) => FrameResult::ShockerExclusive(until),
        }
    }

    /// Apply bus commands and send them to the hub immediately.
    ///
    /// Commands for unknown or paused shockers are skipped; the rest still
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller fails to send the batch.
    pub async fn control(&self, commands: &[ControlCommand]) -> Result<()> {
        let now = Utc::now();
        let shockers = self.snapshot();

        let mut outbound = Vec::with_capacity(commands.len());
        for command in commands {
            let Some(state) = shockers.get(&command.shocker_id) else {
                tracing::debug!(
                    hub_id = %self.hub_id,
                    shocker_id = %command.shocker_id,
                    "Skipping command for unknown shocker"
                );
                continue;
            };

            let mut state = state.lock();
            if state.paused {
                tracing::debug!(
                    hub_id = %self.hub_id,
                    shocker_id = %command.shocker_id,
                    "Skipping command for paused shocker"
                );
                continue;
            }
            outbound.push(state.apply_control(command, now));
        }

        if outbound.is_empty() {
            return Ok(());
        }

        self.controller.control(outbound).await?;
        Ok(())
    }

    /// Reload shockers after the hub was reconfigured and tell viewers.
    ///
    /// Every shocker starts over from an idle state, including ones that
    /// were active or held before the reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails; the previous shockers stay
    /// in place then.
    pub async fn update_device(&self) -> Result<()> {
        let shockers = self.load_shockers()?;
        tracing::info!(
            hub_id = %self.hub_id,
            shockers = shockers.len(),
            "Reloaded hub shockers"
        );

        viewers::broadcast_permissions(self.viewers.as_ref(), self.hub_id, &shockers).await;
        Ok(())
    }

    /// Enable or disable the hub's captive portal.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller fails to send the instruction.
    pub async fn control_captive(&self, enabled: bool) -> Result<()> {
        self.controller.captive_portal(enabled).await?;
        Ok(())
    }

    /// Start an over-the-air firmware install.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller fails to send the instruction.
    pub async fn ota_install(&self, version: &str) -> Result<()> {
        self.controller.ota_install(version).await?;
        Ok(())
    }

    /// Apply a presence heartbeat reported by this hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the presence store fails.
    pub fn online(&self, mut record: PresenceRecord) -> Result<OnlineResult> {
        record.hub_id = self.hub_id;
        self.presence.heartbeat(record)
    }

    /// Stop the control loop and release the controller.
    ///
    /// Returns once the loop has exited. Safe to call more than once.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.cancel.cancel();
        let handle = self.loop_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(hub_id = %self.hub_id, error = %e, "Hub control loop task failed");
            }
        }

        self.controller.dispose().await;
        tracing::debug!(hub_id = %self.hub_id, "Disposed hub lifetime");
    }

    #[cfg(test)]
    pub(crate) fn with_state<R>(
        &self,
        shocker_id: &ShockerId,
        f: impl FnOnce(&mut ShockerState) -> R,
    ) -> Option<R> {
        self.snapshot()
            .get(shocker_id)
            .map(|state| f(&mut state.lock()))
    }
}

impl<S: Store> Drop for HubLifetime<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drive `update` at a fixed rate until cancelled or the lifetime is dropped.
///
/// Only a weak reference is held between iterations, so a lifetime that is
/// dropped without being disposed still stops its loop.
async fn run_loop<S: Store + 'static>(
    lifetime: Weak<HubLifetime<S>>,
    cancel: CancellationToken,
    wait: Duration,
    hub_id: HubId,
) {
    loop {
        let Some(this) = lifetime.upgrade() else {
            break;
        };

        let started = Instant::now();
        let outcome = tokio::select! {
            () = cancel.cancelled() => break,
            outcome = AssertUnwindSafe(this.update()).catch_unwind() => outcome,
        };
        drop(this);

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(hub_id = %hub_id, error = %e, "Error in hub update loop");
            }
            Err(_) => {
                tracing::error!(hub_id = %hub_id, "Hub update loop iteration panicked");
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= wait {
            tracing::warn!(
                hub_id = %hub_id,
                elapsed_ms = elapsed.as_millis(),
                budget_ms = wait.as_millis(),
                "Hub update loop running behind"
            );
            tokio::task::yield_now().await;
            continue;
        }

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(wait - elapsed) => {}
        }
    }

    tracing::debug!(hub_id = %hub_id, "Hub control loop stopped");
}
