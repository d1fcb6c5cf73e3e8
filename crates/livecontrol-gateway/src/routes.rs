//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use livecontrol_store::Store;

use crate::handlers::{health, hubs};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET /v1/hubs` - Hubs connected to this gateway
/// - `GET /v1/hubs/:hub_id` - Connection status of a hub
/// - `POST /v1/hubs/:hub_id/control` - Queue shocker commands
/// - `POST /v1/hubs/:hub_id/captive` - Queue a captive portal toggle
/// - `POST /v1/hubs/:hub_id/ota` - Queue a firmware install
/// - `POST /v1/hubs/:hub_id/update` - Reload the hub's shockers
pub fn create_router<S>(state: GatewayState<S>) -> Router
where
    S: Store + 'static,
{
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health::<S>))
        .route("/v1/hubs", get(hubs::list_hubs::<S>))
        .route("/v1/hubs/:hub_id", get(hubs::get_hub::<S>))
        .route("/v1/hubs/:hub_id/control", post(hubs::control::<S>))
        .route("/v1/hubs/:hub_id/captive", post(hubs::captive::<S>))
        .route("/v1/hubs/:hub_id/ota", post(hubs::ota_install::<S>))
        .route("/v1/hubs/:hub_id/update", post(hubs::update_device::<S>))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
