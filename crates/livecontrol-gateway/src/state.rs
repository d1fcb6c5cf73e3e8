//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use livecontrol_hub::HubLifetimeManager;
use livecontrol_store::Store;

use crate::bus::CommandBus;
use crate::config::GatewayConfig;

/// Shared application state for the gateway.
pub struct GatewayState<S: Store> {
    /// Registry of hubs connected to this gateway.
    pub manager: Arc<HubLifetimeManager<S>>,
    /// Publishing side of the command bus.
    pub bus: CommandBus,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<S: Store> GatewayState<S> {
    /// Create a new gateway state.
    #[must_use]
    pub fn new(manager: Arc<HubLifetimeManager<S>>, bus: CommandBus, config: GatewayConfig) -> Self {
        Self {
            manager,
            bus,
            config,
        }
    }
}

impl<S: Store> Clone for GatewayState<S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            bus: self.bus.clone(),
            config: self.config.clone(),
        }
    }
}
