//! Test fixtures for the gateway: a store with one hub, a mock hub
//! connection and a manager wired to both.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use livecontrol_core::{HubId, ShockerId, ShockerModel, UserId};
use livecontrol_hub::{
    ControllerError, HubConfig, HubController, HubLifetimeManager, InMemoryViewerRegistry,
    PresenceTracker, ShockerCommand,
};
use livecontrol_store::{Hub, MemoryPresenceStore, RocksStore, Shocker, Store};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::{self, BusMessage, CommandBus};
use crate::config::GatewayConfig;
use crate::state::GatewayState;

/// Records everything sent to the hub.
pub struct MockController {
    hub_id: HubId,
    batches: Mutex<Vec<Vec<ShockerCommand>>>,
    captive: Mutex<Vec<bool>>,
    ota: Mutex<Vec<String>>,
}

impl MockController {
    fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            batches: Mutex::new(Vec::new()),
            captive: Mutex::new(Vec::new()),
            ota: Mutex::new(Vec::new()),
        }
    }

    pub fn batches(&self) -> Vec<Vec<ShockerCommand>> {
        self.batches.lock().clone()
    }

    pub fn captive_calls(&self) -> Vec<bool> {
        self.captive.lock().clone()
    }

    pub fn ota_calls(&self) -> Vec<String> {
        self.ota.lock().clone()
    }
}

#[async_trait]
impl HubController for MockController {
    fn hub_id(&self) -> HubId {
        self.hub_id
    }

    async fn control(&self, commands: Vec<ShockerCommand>) -> Result<(), ControllerError> {
        self.batches.lock().push(commands);
        Ok(())
    }

    async fn captive_portal(&self, enabled: bool) -> Result<(), ControllerError> {
        self.captive.lock().push(enabled);
        Ok(())
    }

    async fn ota_install(&self, version: &str) -> Result<(), ControllerError> {
        self.ota.lock().push(version.to_string());
        Ok(())
    }

    async fn dispose(&self) {}
}

/// A running bus consumer.
pub struct RunningConsumer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningConsumer {
    pub async fn stop(self) {
        self.cancel.cancel();
        self.handle.await.unwrap();
    }
}

/// One hub with one shocker, and everything needed to serve it.
pub struct TestHub {
    pub hub_id: HubId,
    pub shocker: Shocker,
    pub manager: Arc<HubLifetimeManager<RocksStore>>,
    pub controller: Arc<MockController>,
    pub presence_store: Arc<MemoryPresenceStore>,
    bus: CommandBus,
    rx: Mutex<Option<mpsc::Receiver<BusMessage>>>,
    _dir: TempDir,
}

impl TestHub {
    /// The hub exists in the store but is not connected.
    pub fn disconnected() -> Self {
        Self::with_bus_capacity(8)
    }

    pub fn with_bus_capacity(capacity: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let hub_id = HubId::generate();

        store
            .put_hub(&Hub {
                hub_id,
                owner_id: UserId::generate(),
                name: "test hub".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        let shocker = Shocker {
            shocker_id: ShockerId::generate(),
            hub_id,
            name: "collar".to_string(),
            rf_id: 4242,
            model: ShockerModel::PetTrainer,
            paused: false,
            created_at: Utc::now(),
        };
        store.put_shocker(&shocker).unwrap();

        let presence_store = Arc::new(MemoryPresenceStore::new());
        let presence = Arc::new(PresenceTracker::new(
            presence_store.clone(),
            Duration::from_secs(60),
            16,
        ));
        let manager = Arc::new(HubLifetimeManager::new(
            store,
            Arc::new(InMemoryViewerRegistry::new()),
            presence,
            HubConfig::default(),
        ));
        let (bus, rx) = CommandBus::new(capacity);

        Self {
            hub_id,
            shocker,
            manager,
            controller: Arc::new(MockController::new(hub_id)),
            presence_store,
            bus,
            rx: Mutex::new(Some(rx)),
            _dir: dir,
        }
    }

    /// The hub is connected at 10 ticks per second.
    pub async fn connected() -> Self {
        let hub = Self::disconnected();
        hub.manager
            .add_device_connection(10, hub.controller.clone())
            .await
            .unwrap();
        hub
    }

    pub fn state(&self) -> GatewayState<RocksStore> {
        GatewayState::new(
            Arc::clone(&self.manager),
            self.bus.clone(),
            GatewayConfig::default(),
        )
    }

    /// Start delivering bus messages. Can only be called once.
    pub fn spawn_consumer(&self) -> RunningConsumer {
        let rx = self.rx.lock().take().unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(bus::run_consumer(
            Arc::clone(&self.manager),
            rx,
            cancel.clone(),
        ));
        RunningConsumer { cancel, handle }
    }
}
