//! Test doubles shared by the unit tests of this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use livecontrol_core::{HubId, ShockerId, ShockerModel, UserId};
use livecontrol_store::{
    Hub, MemoryPresenceStore, PresenceRecord, RocksStore, Shocker, Store, StoreError,
};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};
use tokio::time::Instant;

use crate::controller::{ControllerError, HubController};
use crate::presence::PresenceTracker;
use crate::types::ShockerCommand;
use crate::viewers::{InMemoryViewerRegistry, LiveViewer, ViewerError};

/// Records everything sent to a hub.
pub struct MockController {
    hub_id: HubId,
    batches: Mutex<Vec<Vec<ShockerCommand>>>,
    sent_at: Mutex<Vec<Instant>>,
    captive: Mutex<Vec<bool>>,
    ota: Mutex<Vec<String>>,
    disposed: AtomicUsize,
    failing: AtomicBool,
    panic_next: AtomicBool,
    send_delay: Mutex<Duration>,
}

impl MockController {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            batches: Mutex::new(Vec::new()),
            sent_at: Mutex::new(Vec::new()),
            captive: Mutex::new(Vec::new()),
            ota: Mutex::new(Vec::new()),
            disposed: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            panic_next: AtomicBool::new(false),
            send_delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn batches(&self) -> Vec<Vec<ShockerCommand>> {
        self.batches.lock().clone()
    }

    /// When each batch finished sending.
    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent_at.lock().clone()
    }

    /// Make every batch take this long to send.
    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock() = delay;
    }

    pub fn captive_calls(&self) -> Vec<bool> {
        self.captive.lock().clone()
    }

    pub fn ota_calls(&self) -> Vec<String> {
        self.ota.lock().clone()
    }

    pub fn dispose_count(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ControllerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ControllerError::Send("mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HubController for MockController {
    fn hub_id(&self) -> HubId {
        self.hub_id
    }

    async fn control(&self, commands: Vec<ShockerCommand>) -> Result<(), ControllerError> {
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("mock controller panic");
        }
        let delay = *self.send_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        self.batches.lock().push(commands);
        self.sent_at.lock().push(Instant::now());
        Ok(())
    }

    async fn captive_portal(&self, enabled: bool) -> Result<(), ControllerError> {
        self.check()?;
        self.captive.lock().push(enabled);
        Ok(())
    }

    async fn ota_install(&self, version: &str) -> Result<(), ControllerError> {
        self.check()?;
        self.ota.lock().push(version.to_string());
        Ok(())
    }

    async fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records notifications pushed to a viewer.
#[derive(Default)]
pub struct MockViewer {
    connected: Mutex<Vec<bool>>,
    permissions: Mutex<Vec<Vec<Shocker>>>,
    failing: bool,
}

impl MockViewer {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn connected_states(&self) -> Vec<bool> {
        self.connected.lock().clone()
    }

    pub fn permissions(&self) -> Vec<Vec<Shocker>> {
        self.permissions.lock().clone()
    }

    pub fn permission_pushes(&self) -> usize {
        self.permissions.lock().len()
    }
}

#[async_trait]
impl LiveViewer for MockViewer {
    async fn update_connected_state(&self, connected: bool) -> Result<(), ViewerError> {
        if self.failing {
            return Err(ViewerError::Closed);
        }
        self.connected.lock().push(connected);
        Ok(())
    }

    async fn update_permissions(&self, shockers: &[Shocker]) -> Result<(), ViewerError> {
        if self.failing {
            return Err(ViewerError::Closed);
        }
        self.permissions.lock().push(shockers.to_vec());
        Ok(())
    }
}

/// A viewer that stops inside its first disconnect notification until
/// [`GatedViewer::open`] is called.
pub struct GatedViewer {
    connected: Mutex<Vec<bool>>,
    parked: Notify,
    gate: Semaphore,
}

impl GatedViewer {
    pub fn new() -> Self {
        Self {
            connected: Mutex::new(Vec::new()),
            parked: Notify::new(),
            gate: Semaphore::new(0),
        }
    }

    /// Resolves once a disconnect notification is waiting at the gate.
    pub async fn wait_parked(&self) {
        self.parked.notified().await;
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }

    pub fn connected_states(&self) -> Vec<bool> {
        self.connected.lock().clone()
    }
}

#[async_trait]
impl LiveViewer for GatedViewer {
    async fn update_connected_state(&self, connected: bool) -> Result<(), ViewerError> {
        if !connected {
            self.parked.notify_one();
            let _permit = self.gate.acquire().await.map_err(|_| ViewerError::Closed)?;
        }
        self.connected.lock().push(connected);
        Ok(())
    }

    async fn update_permissions(&self, _shockers: &[Shocker]) -> Result<(), ViewerError> {
        Ok(())
    }
}

/// A `RocksStore` that can be told to fail every call.
pub struct FlakyStore {
    inner: RocksStore,
    failing: AtomicBool,
    _dir: TempDir,
}

impl FlakyStore {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let inner = RocksStore::open(dir.path()).unwrap();
        Self {
            inner,
            failing: AtomicBool::new(false),
            _dir: dir,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> livecontrol_store::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Store for FlakyStore {
    fn put_hub(&self, hub: &Hub) -> livecontrol_store::Result<()> {
        self.check()?;
        self.inner.put_hub(hub)
    }

    fn get_hub(&self, hub_id: &HubId) -> livecontrol_store::Result<Option<Hub>> {
        self.check()?;
        self.inner.get_hub(hub_id)
    }

    fn delete_hub(&self, hub_id: &HubId) -> livecontrol_store::Result<()> {
        self.check()?;
        self.inner.delete_hub(hub_id)
    }

    fn put_shocker(&self, shocker: &Shocker) -> livecontrol_store::Result<()> {
        self.check()?;
        self.inner.put_shocker(shocker)
    }

    fn get_shocker(&self, shocker_id: &ShockerId) -> livecontrol_store::Result<Option<Shocker>> {
        self.check()?;
        self.inner.get_shocker(shocker_id)
    }

    fn delete_shocker(&self, shocker_id: &ShockerId) -> livecontrol_store::Result<()> {
        self.check()?;
        self.inner.delete_shocker(shocker_id)
    }

    fn list_shockers_by_hub(&self, hub_id: &HubId) -> livecontrol_store::Result<Vec<Shocker>> {
        self.check()?;
        self.inner.list_shockers_by_hub(hub_id)
    }
}

/// A hub with some shockers in a throwaway store, plus the shared services a
/// lifetime needs.
pub struct Harness {
    pub hub_id: HubId,
    pub owner_id: UserId,
    pub store: Arc<FlakyStore>,
    pub viewers: Arc<InMemoryViewerRegistry>,
    pub presence: Arc<PresenceTracker>,
    pub shockers: Vec<Shocker>,
}

impl Harness {
    pub fn with_shockers(count: u16) -> Self {
        let store = Arc::new(FlakyStore::new());
        let hub_id = HubId::generate();
        let owner_id = UserId::generate();
        store
            .put_hub(&Hub {
                hub_id,
                owner_id,
                name: "test hub".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();

        let mut harness = Self {
            hub_id,
            owner_id,
            store,
            viewers: Arc::new(InMemoryViewerRegistry::new()),
            presence: Arc::new(PresenceTracker::new(
                Arc::new(MemoryPresenceStore::new()),
                Duration::from_secs(60),
                64,
            )),
            shockers: Vec::new(),
        };
        for rf_id in 0..count {
            let shocker = harness.add_shocker(1_000 + rf_id);
            harness.shockers.push(shocker);
        }
        harness
    }

    /// Pair a new shocker with the hub in the store only.
    pub fn add_shocker(&self, rf_id: u16) -> Shocker {
        let shocker = Shocker {
            shocker_id: ShockerId::generate(),
            hub_id: self.hub_id,
            name: format!("shocker-{rf_id}"),
            rf_id,
            model: ShockerModel::CaiXianlin,
            paused: false,
            created_at: Utc::now(),
        };
        self.store.put_shocker(&shocker).unwrap();
        shocker
    }

    pub fn subscribe_viewer(&self) -> Arc<MockViewer> {
        let viewer = Arc::new(MockViewer::default());
        self.viewers.subscribe(self.hub_id, viewer.clone());
        viewer
    }

    pub fn presence_record(&self) -> PresenceRecord {
        PresenceRecord {
            hub_id: self.hub_id,
            owner_id: self.owner_id,
            firmware_version: "1.2.0".to_string(),
            gateway: "gw-test".to_string(),
            connected_at: Utc::now(),
            user_agent: Some("hub-fw".to_string()),
            booted_at: Utc::now(),
            latency_ms: Some(20),
            rssi: Some(-60),
        }
    }
}
