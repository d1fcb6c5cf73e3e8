//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use livecontrol_store::Store;

use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Gateway instance answering.
    pub gateway_id: String,
    /// Hubs currently connected to this gateway.
    pub connected_hubs: usize,
}

/// Health check handler.
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "gateway_id": "gw-1",
///   "connected_hubs": 3
/// }
/// ```
pub async fn health<S>(State(state): State<Arc<GatewayState<S>>>) -> impl IntoResponse
where
    S: Store + 'static,
{
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gateway_id: state.config.gateway_id.clone(),
        connected_hubs: state.manager.connected_hubs().len(),
    };

    (StatusCode::OK, Json(response))
}
