//! Hub endpoints.
//!
//! Control, captive portal and OTA requests are published on the command bus
//! and answered with `202 Accepted`: the bus consumer delivers them if the hub
//! is connected to this gateway and drops them otherwise. Reloading a hub's
//! configuration goes straight to the manager so the caller learns whether the
//! hub was reachable.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use livecontrol_core::HubId;
use livecontrol_hub::{ControlCommand, DeviceResult};
use livecontrol_store::Store;

use crate::bus::BusMessage;
use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Response for the hub list.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListHubsResponse {
    /// Hubs connected to this gateway.
    pub hubs: Vec<HubId>,
}

/// Connection status of one hub.
#[derive(Debug, Serialize, Deserialize)]
pub struct HubStatusResponse {
    /// Hub ID.
    pub hub_id: HubId,
    /// Whether the hub is connected to this gateway.
    pub connected: bool,
    /// Tick rate of the hub's control loop, when connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tps: Option<u8>,
    /// Number of shockers loaded for the hub, when connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shockers: Option<usize>,
}

/// Request to control shockers of a hub.
#[derive(Debug, Deserialize)]
pub struct ControlBody {
    /// Commands to apply.
    pub commands: Vec<ControlCommand>,
}

/// Request to toggle the captive portal.
#[derive(Debug, Deserialize)]
pub struct CaptiveBody {
    /// Whether the portal should be enabled.
    pub enabled: bool,
}

/// Request to install firmware.
#[derive(Debug, Deserialize)]
pub struct OtaBody {
    /// Firmware version to install.
    pub version: String,
}

/// Response for requests queued on the command bus.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    /// Hub the request was queued for.
    pub hub_id: HubId,
}

// =============================================================================
// Handlers
// =============================================================================

/// List hubs connected to this gateway.
pub async fn list_hubs<S>(State(state): State<Arc<GatewayState<S>>>) -> impl IntoResponse
where
    S: Store + 'static,
{
    Json(ListHubsResponse {
        hubs: state.manager.connected_hubs(),
    })
}

/// Connection status of a hub.
///
/// # Errors
///
/// Returns an error if the hub ID is malformed.
pub async fn get_hub<S>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(hub_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: Store + 'static,
{
    let hub_id = parse_hub_id(&hub_id)?;
    let lifetime = state.manager.get(&hub_id);

    Ok(Json(HubStatusResponse {
        hub_id,
        connected: lifetime.is_some(),
        tps: lifetime.as_ref().map(|l| l.timing().tps),
        shockers: lifetime.as_ref().map(|l| l.shocker_ids().len()),
    }))
}

/// Queue control commands for a hub.
///
/// # Errors
///
/// Returns an error if the request is malformed or the bus is unavailable.
pub async fn control<S>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(hub_id): Path<String>,
    Json(body): Json<ControlBody>,
) -> Result<impl IntoResponse, ApiError>
where
    S: Store + 'static,
{
    let hub_id = parse_hub_id(&hub_id)?;
    if body.commands.is_empty() {
        return Err(ApiError::BadRequest("commands must not be empty".to_string()));
    }

    tracing::debug!(hub_id = %hub_id, commands = body.commands.len(), "Queueing control commands");
    state.bus.publish(BusMessage::Control {
        hub_id,
        commands: body.commands,
    })?;

    Ok(accepted(hub_id))
}

/// Queue a captive portal toggle for a hub.
///
/// # Errors
///
/// Returns an error if the hub ID is malformed or the bus is unavailable.
pub async fn captive<S>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(hub_id): Path<String>,
    Json(body): Json<CaptiveBody>,
) -> Result<impl IntoResponse, ApiError>
where
    S: Store + 'static,
{
    let hub_id = parse_hub_id(&hub_id)?;
    state.bus.publish(BusMessage::Captive {
        hub_id,
        enabled: body.enabled,
    })?;

    Ok(accepted(hub_id))
}

/// Queue a firmware install for a hub.
///
/// # Errors
///
/// Returns an error if the request is malformed or the bus is unavailable.
pub async fn ota_install<S>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(hub_id): Path<String>,
    Json(body): Json<OtaBody>,
) -> Result<impl IntoResponse, ApiError>
where
    S: Store + 'static,
{
    let hub_id = parse_hub_id(&hub_id)?;
    let version = body.version.trim();
    if version.is_empty() {
        return Err(ApiError::BadRequest("version must not be empty".to_string()));
    }

    tracing::info!(hub_id = %hub_id, version = %version, "Queueing OTA install");
    state.bus.publish(BusMessage::OtaInstall {
        hub_id,
        version: version.to_string(),
    })?;

    Ok(accepted(hub_id))
}

/// Reload a hub's shockers after its configuration changed.
///
/// # Errors
///
/// Returns `404` if the hub is not connected to this gateway, or an error if
/// the reload fails.
pub async fn update_device<S>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(hub_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: Store + 'static,
{
    let hub_id = parse_hub_id(&hub_id)?;

    match state.manager.update_device(&hub_id).await? {
        DeviceResult::Success => Ok(StatusCode::NO_CONTENT),
        DeviceResult::DeviceNotFound => Err(ApiError::NotFound(format!("hub {hub_id}"))),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_hub_id(s: &str) -> Result<HubId, ApiError> {
    s.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid hub ID: {s}")))
}

fn accepted(hub_id: HubId) -> (StatusCode, Json<AcceptedResponse>) {
    (StatusCode::ACCEPTED, Json(AcceptedResponse { hub_id }))
}
