//! LiveControl Gateway
//!
//! Entry point for the gateway service. Wires the metadata store, presence
//! tracking, hub lifetime manager and command bus together and serves the
//! internal HTTP API until interrupted.
//!
//! On shutdown every hub lifetime is disposed, so no control loop outlives
//! the process's intent to stop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livecontrol_gateway::{background, bus, create_router, CommandBus, GatewayConfig, GatewayState};
use livecontrol_hub::{HubLifetimeManager, InMemoryViewerRegistry, PresenceTracker};
use livecontrol_store::{MemoryPresenceStore, RocksStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,livecontrol=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LiveControl Gateway");

    let config = GatewayConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        gateway_id = %config.gateway_id,
        presence_ttl_seconds = config.presence_ttl_seconds,
        bus_capacity = config.bus_capacity,
        "Gateway configuration loaded"
    );

    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    let hub_config = config.hub_config();
    let presence_store = Arc::new(MemoryPresenceStore::new());
    let presence = Arc::new(PresenceTracker::new(
        presence_store.clone(),
        hub_config.presence_ttl(),
        hub_config.presence_event_capacity,
    ));
    let manager = Arc::new(HubLifetimeManager::new(
        store,
        Arc::new(InMemoryViewerRegistry::new()),
        Arc::clone(&presence),
        hub_config,
    ));

    let cancel = CancellationToken::new();
    let (command_bus, rx) = CommandBus::new(config.bus_capacity);

    let consumer = tokio::spawn(bus::run_consumer(Arc::clone(&manager), rx, cancel.clone()));
    let presence_logger = tokio::spawn(background::run_presence_logger(
        presence.subscribe(),
        cancel.clone(),
    ));
    let presence_purge = tokio::spawn(background::run_presence_purge(
        presence_store,
        config.presence_purge_interval(),
        cancel.clone(),
    ));

    let listen_addr = config.listen_addr.clone();
    let app = create_router(GatewayState::new(Arc::clone(&manager), command_bus, config));
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    tracing::info!("HTTP server stopped, shutting down");
    cancel.cancel();
    for task in [consumer, presence_logger, presence_purge] {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Background task failed");
        }
    }
    manager.dispose_all().await;

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Resolve on ctrl-c, or when something else cancelled the token.
async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Shutdown signal received");
        }
        () = cancel.cancelled() => {}
    }
    cancel.cancel();
}
