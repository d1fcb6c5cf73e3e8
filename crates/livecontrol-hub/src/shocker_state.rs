//! Runtime state of a single shocker.
//!
//! Two windows drive everything:
//!
//! - `active_until`: the last command keeps being re-sent by the tick loop
//!   until this time, so a dropped radio packet is masked by the next one.
//! - `exclusive_until`: until this time only the bus command that took the
//!   hold may change the shocker; live frames are rejected.
//!
//! The active window never affects who may write, and the exclusive window
//! never extends transmission.

use chrono::{DateTime, Duration, Utc};
use livecontrol_core::{clamp_duration_ms, clamp_intensity, ControlType, ShockerId, ShockerModel};
use livecontrol_store::Shocker;

use crate::types::{ControlCommand, ShockerCommand};

/// Timestamp used for "no window".
pub const FAR_PAST: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// How long a live frame stays active at the sender's tick rate.
///
/// Two and a half ticks, so that consecutive frames overlap, but never below
/// `floor`.
#[must_use]
pub fn active_window(tps: u8, floor: Duration) -> Duration {
    let tps = i64::from(tps.max(1));
    let window = Duration::milliseconds(2_500 / tps);
    window.max(floor)
}

/// Mutable runtime record for one shocker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShockerState {
    /// Database identity.
    pub id: ShockerId,
    /// Short id used on the radio link.
    pub rf_id: u16,
    /// Hardware variant.
    pub model: ShockerModel,
    /// The owner paused this shocker; nothing is sent to it.
    pub paused: bool,
    /// Last commanded action.
    pub last_type: ControlType,
    /// Last commanded intensity.
    pub last_intensity: u8,
    /// The tick loop re-sends the last command until this time.
    pub active_until: DateTime<Utc>,
    /// Live frames are rejected until this time.
    pub exclusive_until: DateTime<Utc>,
}

impl ShockerState {
    /// Fresh, idle state for a stored shocker.
    #[must_use]
    pub fn new(shocker: &Shocker) -> Self {
        Self {
            id: shocker.shocker_id,
            rf_id: shocker.rf_id,
            model: shocker.model,
            paused: shocker.paused,
            last_type: ControlType::Stop,
            last_intensity: 0,
            active_until: FAR_PAST,
            exclusive_until: FAR_PAST,
        }
    }

    /// Returns true while an exclusive hold is in force.
    #[must_use]
    pub fn is_exclusive(&self, now: DateTime<Utc>) -> bool {
        self.exclusive_until > now
    }

    /// Returns true if the tick loop should re-send the last command.
    #[must_use]
    pub fn should_transmit(&self, now: DateTime<Utc>) -> bool {
        !self.paused && self.active_until >= now && self.exclusive_until < now
    }

    /// Apply a live frame.
    ///
    /// # Errors
    ///
    /// Returns the end of the exclusive hold if one is in force; the state is
    /// left untouched in that case.
    pub fn apply_frame(
        &mut self,
        command_type: ControlType,
        intensity: u8,
        active_for: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), DateTime<Utc>> {
        if self.is_exclusive(now) {
            return Err(self.exclusive_until);
        }

        self.last_type = command_type;
        self.last_intensity = clamp_intensity(intensity);
        self.active_until = now + active_for;
        Ok(())
    }

    /// Apply a bus command and return what should be sent to the hub for it.
    ///
    /// Bus commands always win: they overwrite the last command regardless of
    /// any hold, take a new hold when asked to, and a stop releases any hold.
    pub fn apply_control(&mut self, command: &ControlCommand, now: DateTime<Utc>) -> ShockerCommand {
        let duration_ms = clamp_duration_ms(command.duration_ms);

        self.exclusive_until = if command.exclusive && !command.command_type.is_stop() {
            now + Duration::milliseconds(i64::from(duration_ms))
        } else {
            FAR_PAST
        };
        self.last_type = command.command_type;
        self.last_intensity = clamp_intensity(command.intensity);

        self.command(duration_ms)
    }

    /// Build the wire command for the last commanded action.
    #[must_use]
    pub fn command(&self, duration_ms: u16) -> ShockerCommand {
        ShockerCommand {
            rf_id: self.rf_id,
            model: self.model,
            command_type: self.last_type,
            duration_ms,
            intensity: self.last_intensity,
        }
    }
}
