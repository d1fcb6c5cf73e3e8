//! Hub lifetimes for livecontrol.
//!
//! Every hub connected to a gateway gets a [`HubLifetime`]: the runtime state
//! of its shockers plus a fixed-rate loop that keeps re-sending active
//! commands. The [`HubLifetimeManager`] owns all lifetimes of a process and is
//! the single entry point for routing work to a hub.
//!
//! # Command sources
//!
//! - **Live frames** arrive many times per second from a live-control session
//!   and are re-sent by the loop for about two and a half of the sender's
//!   frames.
//! - **Bus commands** arrive from the HTTP API or other services. They always
//!   win, are sent immediately, and may take an exclusive hold that locks out
//!   live frames for the command's duration.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use livecontrol_hub::{HubConfig, HubLifetimeManager, InMemoryViewerRegistry, PresenceTracker};
//!
//! let config = HubConfig::default();
//! let presence = Arc::new(PresenceTracker::new(
//!     presence_store,
//!     config.presence_ttl(),
//!     config.presence_event_capacity,
//! ));
//! let manager = HubLifetimeManager::new(store, Arc::new(InMemoryViewerRegistry::new()), presence, config);
//!
//! // When a hub's websocket is accepted:
//! manager.add_device_connection(10, controller).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod controller;
pub mod error;
pub mod lifetime;
pub mod manager;
pub mod presence;
pub mod shocker_state;
pub mod types;
pub mod viewers;

#[cfg(test)]
mod test_support;

pub use controller::{ControllerError, HubController};
pub use error::{HubError, Result};
pub use lifetime::{HubLifetime, TickTiming};
pub use manager::HubLifetimeManager;
pub use presence::{PresenceEvent, PresenceEventKind, PresenceTracker};
pub use shocker_state::ShockerState;
pub use types::{
    ControlCommand, DeviceResult, FrameResult, HubConfig, OnlineResult, ShockerCommand,
};
pub use viewers::{InMemoryViewerRegistry, LiveViewer, ViewerError, ViewerRegistry};
