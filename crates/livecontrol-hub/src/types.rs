//! Command, result and configuration types for hub lifetimes.

use chrono::{DateTime, Utc};
use livecontrol_core::{ControlType, ShockerId, ShockerModel};
use serde::{Deserialize, Serialize};

/// A command as transmitted to the hub.
///
/// This is addressed by radio id and model rather than by shocker id; the hub
/// knows nothing about database identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockerCommand {
    /// Short id used on the radio link.
    pub rf_id: u16,
    /// Hardware variant, selects the radio protocol.
    pub model: ShockerModel,
    /// What to do.
    pub command_type: ControlType,
    /// How long to do it for, in milliseconds.
    pub duration_ms: u16,
    /// How hard, `0..=100`.
    pub intensity: u8,
}

/// A control command delivered over the command bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCommand {
    /// The target shocker.
    pub shocker_id: ShockerId,
    /// What to do.
    #[serde(rename = "type")]
    pub command_type: ControlType,
    /// How hard, `0..=100`.
    pub intensity: u8,
    /// How long, in milliseconds.
    pub duration_ms: u16,
    /// Hold the shocker exclusively for the command's duration, locking out
    /// live frames from other sources.
    #[serde(default)]
    pub exclusive: bool,
}

/// Outcome of routing a live control frame.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    /// The frame was applied.
    Success,
    /// The hub is not connected to this gateway.
    DeviceNotFound,
    /// The hub has no shocker with that id.
    ShockerNotFound,
    /// The shocker is paused by its owner.
    ShockerPaused,
    /// The shocker is held exclusively until the given time.
    ShockerExclusive(DateTime<Utc>),
}

/// Outcome of routing a hub-level instruction.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceResult {
    /// The instruction was handed to the hub's lifetime.
    Success,
    /// The hub is not connected to this gateway.
    DeviceNotFound,
}

/// Outcome of a presence heartbeat.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineResult {
    /// Presence was refreshed, nothing observers care about changed.
    Success,
    /// The hub came online or its identity fields changed; an event was broadcast.
    OnlineStateUpdated,
    /// The hub is not connected to this gateway.
    DeviceNotFound,
}

/// Configuration for hub lifetimes.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// How long a presence record lives without a heartbeat (seconds).
    pub presence_ttl_seconds: u64,
    /// Lower bound for how long a live frame keeps being re-transmitted (milliseconds).
    pub min_active_window_ms: u64,
    /// Capacity of the presence event broadcast channel.
    pub presence_event_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            presence_ttl_seconds: 65,
            min_active_window_ms: 250,
            presence_event_capacity: 256,
        }
    }
}

impl HubConfig {
    /// Presence TTL as a `Duration`.
    #[must_use]
    pub const fn presence_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.presence_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_config_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.presence_ttl_seconds, 65);
        assert_eq!(config.min_active_window_ms, 250);
        assert_eq!(config.presence_ttl(), std::time::Duration::from_secs(65));
    }
}
