//! HTTP gateway for livecontrol hubs.
//!
//! The gateway process owns the [`HubLifetimeManager`](livecontrol_hub::HubLifetimeManager)
//! for every hub connected to it and exposes an internal API for routing work
//! to those hubs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Internal API clients                      │
//! └──────────────────────────────────────────────────────────┘
//!                             │ HTTP
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  livecontrol-gateway                      │
//! │  ┌─────────────┐   ┌─────────────┐   ┌───────────────┐   │
//! │  │   Router    │──▶│ Command bus │──▶│  Bus consumer │   │
//! │  │ + Handlers  │   └─────────────┘   └───────────────┘   │
//! │  └─────────────┘                             │           │
//! │         │ update                             ▼           │
//! │         └──────────────────────▶ HubLifetimeManager      │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//!               ┌─────────────┼─────────────┐
//!               ▼             ▼             ▼
//!        ┌──────────┐  ┌──────────┐  ┌──────────┐
//!        │  Hub A   │  │  Hub B   │  │  Hub C   │
//!        │ lifetime │  │ lifetime │  │ lifetime │
//!        └──────────┘  └──────────┘  └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use livecontrol_gateway::{create_router, CommandBus, GatewayConfig, GatewayState};
//! use livecontrol_hub::{HubLifetimeManager, InMemoryViewerRegistry, PresenceTracker};
//! use livecontrol_store::{MemoryPresenceStore, RocksStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::default();
//! let hub_config = config.hub_config();
//!
//! let store = Arc::new(RocksStore::open("/tmp/livecontrol")?);
//! let presence = Arc::new(PresenceTracker::new(
//!     Arc::new(MemoryPresenceStore::new()),
//!     hub_config.presence_ttl(),
//!     hub_config.presence_event_capacity,
//! ));
//! let manager = Arc::new(HubLifetimeManager::new(
//!     store,
//!     Arc::new(InMemoryViewerRegistry::new()),
//!     presence,
//!     hub_config,
//! ));
//!
//! let (bus, _rx) = CommandBus::new(config.bus_capacity);
//! let app = create_router(GatewayState::new(manager, bus, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod bus;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;

pub use bus::{BusError, BusMessage, CommandBus};
pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
