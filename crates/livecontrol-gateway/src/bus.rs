//! In-process command bus.
//!
//! HTTP handlers and other producers publish [`BusMessage`]s; a single
//! consumer task routes them to the hub lifetime manager. Delivery is
//! at-most-once: a message for a hub that is not connected to this gateway is
//! dropped, and publishing fails rather than blocks when the queue is full.

use std::sync::Arc;

use livecontrol_core::HubId;
use livecontrol_hub::{ControlCommand, DeviceResult, HubLifetimeManager};
use livecontrol_store::Store;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A message addressed to one hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    /// Control commands for shockers of the hub.
    Control {
        /// Target hub.
        hub_id: HubId,
        /// Commands to apply.
        commands: Vec<ControlCommand>,
    },
    /// Toggle the hub's captive portal.
    Captive {
        /// Target hub.
        hub_id: HubId,
        /// Whether the portal should be enabled.
        enabled: bool,
    },
    /// Install a firmware version over the air.
    OtaInstall {
        /// Target hub.
        hub_id: HubId,
        /// Firmware version to install.
        version: String,
    },
}

impl BusMessage {
    /// The hub this message is addressed to.
    #[must_use]
    pub const fn hub_id(&self) -> HubId {
        match self {
            Self::Control { hub_id, .. }
            | Self::Captive { hub_id, .. }
            | Self::OtaInstall { hub_id, .. } => *hub_id,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Control { .. } => "control",
            Self::Captive { .. } => "captive",
            Self::OtaInstall { .. } => "ota_install",
        }
    }
}

/// Errors returned when publishing to the bus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    /// The queue is full.
    #[error("command bus is full")]
    Full,

    /// The consumer has shut down.
    #[error("command bus is closed")]
    Closed,
}

/// Publishing side of the command bus.
#[derive(Debug, Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<BusMessage>,
}

impl CommandBus {
    /// Create a bus holding up to `capacity` undelivered messages.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BusMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue a message for delivery.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Full` if the queue is full and `BusError::Closed` if
    /// the consumer is gone.
    pub fn publish(&self, message: BusMessage) -> Result<(), BusError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => BusError::Full,
            mpsc::error::TrySendError::Closed(_) => BusError::Closed,
        })
    }
}

/// Deliver bus messages to the manager until cancelled or every publisher is
/// dropped.
pub async fn run_consumer<S: Store + 'static>(
    manager: Arc<HubLifetimeManager<S>>,
    mut rx: mpsc::Receiver<BusMessage>,
    cancel: CancellationToken,
) {
    tracing::info!("Command bus consumer started");

    loop {
        let message = tokio::select! {
            () = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let hub_id = message.hub_id();
        let kind = message.kind();
        match dispatch(&manager, message).await {
            Ok(DeviceResult::Success) => {
                tracing::trace!(hub_id = %hub_id, kind, "Delivered bus message");
            }
            Ok(DeviceResult::DeviceNotFound) => {
                tracing::debug!(hub_id = %hub_id, kind, "Dropping bus message for unconnected hub");
            }
            Err(e) => {
                tracing::warn!(hub_id = %hub_id, kind, error = %e, "Failed to deliver bus message");
            }
        }
    }

    tracing::info!("Command bus consumer stopped");
}

async fn dispatch<S: Store + 'static>(
    manager: &HubLifetimeManager<S>,
    message: BusMessage,
) -> livecontrol_hub::Result<DeviceResult> {
    match message {
        BusMessage::Control { hub_id, commands } => manager.control(&hub_id, &commands).await,
        BusMessage::Captive { hub_id, enabled } => manager.control_captive(&hub_id, enabled).await,
        BusMessage::OtaInstall { hub_id, version } => manager.ota_install(&hub_id, &version).await,
    }
}
