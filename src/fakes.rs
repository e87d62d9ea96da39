//! In-process fake platform services.
//!
//! These stand in for the OS surfaces behind the [`platform`](crate::platform)
//! traits, both for this crate's own tests and for embedders running
//! the bridge in a simulator. Every fake records the calls it receives
//! so tests can assert on subscription lifecycles and prompt flows.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::PlatformFault;
use crate::platform::{
    BondedDeviceRegistry, LocationServices, PermissionAuthority, Preferences, StatusPresenter,
    SubscriptionHandle, SystemSettings, UpdateSink,
};
use crate::types::{BondedDevice, Permission, Position, Provider};

/// Permission authority with a scriptable grant set.
#[derive(Default)]
pub struct FakePermissions {
    granted: Mutex<HashSet<Permission>>,
    requests: Mutex<Vec<Vec<Permission>>>,
}

impl FakePermissions {
    /// No permissions granted.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pre-granted permissions.
    pub fn granting(permissions: &[Permission]) -> Arc<Self> {
        let fake = Self::default();
        fake.granted.lock().unwrap().extend(permissions);
        Arc::new(fake)
    }

    pub fn grant(&self, permission: Permission) {
        self.granted.lock().unwrap().insert(permission);
    }

    pub fn revoke(&self, permission: Permission) {
        self.granted.lock().unwrap().remove(&permission);
    }

    /// Every permission set passed to `begin_request` so far.
    pub fn requests(&self) -> Vec<Vec<Permission>> {
        self.requests.lock().unwrap().clone()
    }
}

impl PermissionAuthority for FakePermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted.lock().unwrap().contains(&permission)
    }

    fn begin_request(&self, permissions: &[Permission]) -> Result<(), PlatformFault> {
        self.requests.lock().unwrap().push(permissions.to_vec());
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
enum LivePlan {
    /// Never deliver an update.
    #[default]
    Silent,
    /// Deliver `fix` to each new subscription after `after`.
    Deliver { fix: Position, after: Duration },
}

#[derive(Default)]
struct LocationState {
    enabled: HashSet<Provider>,
    cached: HashMap<Provider, Position>,
    live: LivePlan,
    subscribe_fault: Option<PlatformFault>,
    last_known_fault: Option<PlatformFault>,
    next_handle: u64,
    active: HashSet<u64>,
    subscribed: u32,
    removed: u32,
    max_active: usize,
    last_known_queries: u32,
    last_provider: Option<Provider>,
    last_sink: Option<UpdateSink>,
}

/// Location subsystem with scriptable providers, fix store and live
/// update delivery.
#[derive(Default)]
pub struct FakeLocationServices {
    state: Mutex<LocationState>,
}

impl FakeLocationServices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enable(&self, provider: Provider) {
        self.state.lock().unwrap().enabled.insert(provider);
    }

    pub fn disable(&self, provider: Provider) {
        self.state.lock().unwrap().enabled.remove(&provider);
    }

    pub fn set_cached(&self, provider: Provider, fix: Option<Position>) {
        let mut state = self.state.lock().unwrap();
        match fix {
            Some(fix) => state.cached.insert(provider, fix),
            None => state.cached.remove(&provider),
        };
    }

    /// Each new subscription receives `fix` on a background thread
    /// after `after`.
    pub fn deliver_live(&self, fix: Position, after: Duration) {
        self.state.lock().unwrap().live = LivePlan::Deliver { fix, after };
    }

    /// The next `request_updates` call fails with `fault`.
    pub fn fail_subscribe(&self, fault: PlatformFault) {
        self.state.lock().unwrap().subscribe_fault = Some(fault);
    }

    /// The next `last_known` call fails with `fault`.
    pub fn fail_last_known(&self, fault: PlatformFault) {
        self.state.lock().unwrap().last_known_fault = Some(fault);
    }

    pub fn subscribe_count(&self) -> u32 {
        self.state.lock().unwrap().subscribed
    }

    pub fn remove_count(&self) -> u32 {
        self.state.lock().unwrap().removed
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state.lock().unwrap().active.len()
    }

    pub fn max_concurrent_subscriptions(&self) -> usize {
        self.state.lock().unwrap().max_active
    }

    pub fn last_known_queries(&self) -> u32 {
        self.state.lock().unwrap().last_known_queries
    }

    pub fn last_subscribed_provider(&self) -> Option<Provider> {
        self.state.lock().unwrap().last_provider
    }

    /// Drives the most recent sink directly, as a provider delivering
    /// (possibly late or duplicate) updates would.
    pub fn fire_update(&self, fix: Position) {
        let sink = self.state.lock().unwrap().last_sink.clone();
        if let Some(sink) = sink {
            (*sink)(fix);
        }
    }
}

impl LocationServices for FakeLocationServices {
    fn is_enabled(&self, provider: Provider) -> bool {
        self.state.lock().unwrap().enabled.contains(&provider)
    }

    fn last_known(&self, provider: Provider) -> Result<Option<Position>, PlatformFault> {
        let mut state = self.state.lock().unwrap();
        state.last_known_queries += 1;
        if let Some(fault) = state.last_known_fault.take() {
            return Err(fault);
        }
        Ok(state.cached.get(&provider).copied())
    }

    fn request_updates(
        &self,
        provider: Provider,
        sink: UpdateSink,
    ) -> Result<SubscriptionHandle, PlatformFault> {
        let mut state = self.state.lock().unwrap();
        if let Some(fault) = state.subscribe_fault.take() {
            return Err(fault);
        }
        state.next_handle += 1;
        let handle = state.next_handle;
        state.active.insert(handle);
        state.max_active = state.max_active.max(state.active.len());
        state.subscribed += 1;
        state.last_provider = Some(provider);
        state.last_sink = Some(Arc::clone(&sink));
        if let LivePlan::Deliver { fix, after } = state.live {
            std::thread::spawn(move || {
                std::thread::sleep(after);
                (*sink)(fix);
            });
        }
        Ok(SubscriptionHandle(handle))
    }

    fn remove_updates(&self, handle: SubscriptionHandle) {
        let mut state = self.state.lock().unwrap();
        state.removed += 1;
        state.active.remove(&handle.0);
    }
}

#[derive(Default)]
struct RegistryState {
    enabled: bool,
    devices: Vec<BondedDevice>,
    fault: Option<PlatformFault>,
}

/// Bluetooth bond list with a scriptable device set.
#[derive(Default)]
pub struct FakeBondedRegistry {
    state: Mutex<RegistryState>,
}

impl FakeBondedRegistry {
    /// Adapter off, no devices.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().enabled = enabled;
    }

    pub fn set_devices(&self, devices: Vec<BondedDevice>) {
        self.state.lock().unwrap().devices = devices;
    }

    /// The next `bonded_devices` call fails with `fault`.
    pub fn fail_bonded(&self, fault: PlatformFault) {
        self.state.lock().unwrap().fault = Some(fault);
    }
}

impl BondedDeviceRegistry for FakeBondedRegistry {
    fn adapter_enabled(&self) -> bool {
        self.state.lock().unwrap().enabled
    }

    fn bonded_devices(&self) -> Result<Vec<BondedDevice>, PlatformFault> {
        let mut state = self.state.lock().unwrap();
        if let Some(fault) = state.fault.take() {
            return Err(fault);
        }
        Ok(state.devices.clone())
    }
}

/// Preference store with a single monitoring flag.
#[derive(Default)]
pub struct FakePreferences {
    monitoring: AtomicBool,
}

impl FakePreferences {
    pub fn new(monitoring: bool) -> Arc<Self> {
        let fake = Self::default();
        fake.monitoring.store(monitoring, Ordering::SeqCst);
        Arc::new(fake)
    }

    pub fn set_monitoring(&self, enabled: bool) {
        self.monitoring.store(enabled, Ordering::SeqCst);
    }
}

impl Preferences for FakePreferences {
    fn monitoring_enabled(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }
}

/// Notification surface capturing everything published.
#[derive(Default)]
pub struct FakePresenter {
    published: Mutex<Vec<(String, String)>>,
}

impl FakePresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

impl StatusPresenter for FakePresenter {
    fn publish(&self, title: &str, text: &str) {
        self.published
            .lock()
            .unwrap()
            .push((title.to_string(), text.to_string()));
    }
}

/// Settings surface counting how often screens were opened.
#[derive(Default)]
pub struct FakeSettings {
    opened: AtomicU32,
}

impl FakeSettings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }
}

impl SystemSettings for FakeSettings {
    fn open_location_settings(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }
}
