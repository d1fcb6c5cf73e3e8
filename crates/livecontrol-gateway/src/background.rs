//! Long-running housekeeping tasks spawned by the gateway binary.

use std::sync::Arc;
use std::time::Duration;

use livecontrol_hub::{PresenceEvent, PresenceEventKind};
use livecontrol_store::MemoryPresenceStore;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Log presence changes until cancelled.
pub async fn run_presence_logger(
    mut events: broadcast::Receiver<PresenceEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(event) => log_presence_event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Presence logger fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn log_presence_event(event: &PresenceEvent) {
    match event.kind {
        PresenceEventKind::Online => {
            let firmware = event.record.as_ref().map(|r| r.firmware_version.as_str());
            tracing::info!(
                hub_id = %event.hub_id,
                owner_id = %event.owner_id,
                firmware = ?firmware,
                "Hub online"
            );
        }
        PresenceEventKind::Updated => {
            tracing::info!(hub_id = %event.hub_id, "Hub presence updated");
        }
        PresenceEventKind::Offline => {
            tracing::info!(hub_id = %event.hub_id, owner_id = %event.owner_id, "Hub offline");
        }
    }
}

/// Periodically drop expired presence records until cancelled.
///
/// Expired records are already invisible to readers; this only reclaims
/// memory held by hubs that vanished without a clean disconnect.
pub async fn run_presence_purge(
    store: Arc<MemoryPresenceStore>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let purged = store.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired presence records");
        }
    }
}
