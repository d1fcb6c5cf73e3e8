//! Domain types stored in the database.
//!
//! Hubs and their shockers are managed elsewhere (account CRUD); the gateway
//! only reads them to build runtime state.

use chrono::{DateTime, Utc};
use livecontrol_core::{HubId, ShockerId, ShockerModel, UserId};
use serde::{Deserialize, Serialize};

/// A hub record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    /// Unique identifier for the hub.
    pub hub_id: HubId,
    /// Owner user ID.
    pub owner_id: UserId,
    /// Human-readable name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A shocker record, one actuator attached to a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shocker {
    /// Unique identifier for the shocker.
    pub shocker_id: ShockerId,
    /// The hub this shocker is paired with.
    pub hub_id: HubId,
    /// Human-readable name.
    pub name: String,
    /// Short id used on the radio link.
    pub rf_id: u16,
    /// Hardware variant.
    pub model: ShockerModel,
    /// Paused shockers stay listed but owners may refuse control upstream.
    #[serde(default)]
    pub paused: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
