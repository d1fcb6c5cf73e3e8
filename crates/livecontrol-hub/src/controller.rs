//! The hub controller capability.
//!
//! A hub controller is the transport object behind one hub connection. It
//! knows how to encode commands onto the socket; this crate only needs to hand
//! it batches and tell it when to shut down.

use async_trait::async_trait;
use livecontrol_core::HubId;
use thiserror::Error;

use crate::types::ShockerCommand;

/// Errors reported by a hub controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The underlying connection is gone.
    #[error("hub connection closed")]
    Closed,

    /// Sending to the hub failed.
    #[error("failed to send to hub: {0}")]
    Send(String),
}

/// Capability to drive one connected hub.
///
/// Implementations are owned by the transport layer and shared with the
/// hub's lifetime for as long as the connection lives.
#[async_trait]
pub trait HubController: Send + Sync {
    /// The hub this controller is connected to.
    fn hub_id(&self) -> HubId;

    /// Send a batch of shocker commands to the hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be written to the connection.
    async fn control(&self, commands: Vec<ShockerCommand>) -> Result<(), ControllerError>;

    /// Enable or disable the hub's captive configuration portal.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not be written to the connection.
    async fn captive_portal(&self, enabled: bool) -> Result<(), ControllerError>;

    /// Instruct the hub to install a firmware version over the air.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not be written to the connection.
    async fn ota_install(&self, version: &str) -> Result<(), ControllerError>;

    /// Close the connection and release its resources.
    ///
    /// Called once by the owning lifetime, but may also be reached from the
    /// transport's own teardown, so it must be idempotent.
    async fn dispose(&self);
}
