//! Core types and utilities for livecontrol.
//!
//! This crate provides the foundational types used throughout the gateway:
//!
//! - **Identifiers**: Strongly-typed UUID ids for hubs, shockers and users
//! - **Control vocabulary**: control types, shocker models and value limits
//!
//! # Example
//!
//! ```
//! use livecontrol_core::{ControlType, HubId, ShockerId};
//!
//! let hub_id: HubId = "6d2f8b0e-3c1a-4f5e-9b7d-0a1b2c3d4e5f".parse().unwrap();
//! let shocker_id = ShockerId::generate();
//!
//! assert!(ControlType::Stop.is_stop());
//! # let _ = (hub_id, shocker_id);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod control;
pub mod ids;

pub use control::{clamp_duration_ms, clamp_intensity, ControlType, ShockerModel};
pub use ids::{HubId, IdError, ShockerId, UserId};
