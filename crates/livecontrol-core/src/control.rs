//! Control vocabulary shared by every crate.
//!
//! These are the values that travel from clients and the command bus down to
//! the hub: what an actuator should do, how hard, and which hardware variant
//! it is.

use serde::{Deserialize, Serialize};

/// Maximum intensity accepted for any command.
pub const MAX_INTENSITY: u8 = 100;

/// Shortest duration, in milliseconds, a bus-originated command may request.
pub const MIN_DURATION_MS: u16 = 300;

/// Longest duration, in milliseconds, a bus-originated command may request.
pub const MAX_DURATION_MS: u16 = 30_000;

/// The action an actuator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    /// Stop any ongoing output.
    #[default]
    Stop,
    /// Electrical stimulation.
    Shock,
    /// Vibration.
    Vibrate,
    /// Audible beep.
    Sound,
}

impl ControlType {
    /// Returns true for the stop command.
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Hardware variant of a shocker, needed by the hub to pick the radio protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockerModel {
    /// CaiXianlin style receivers.
    CaiXianlin,
    /// Petrainer 998DR and compatible.
    PetTrainer,
    /// Petrainer 998DR, alternate protocol.
    Petrainer998Dr,
}

/// Clamp an intensity into the accepted `0..=100` range.
#[must_use]
pub fn clamp_intensity(intensity: u8) -> u8 {
    intensity.min(MAX_INTENSITY)
}

/// Clamp a bus command duration into the accepted range.
#[must_use]
pub fn clamp_duration_ms(duration_ms: u16) -> u16 {
    duration_ms.clamp(MIN_DURATION_MS, MAX_DURATION_MS)
}
