//! Paired-smartwatch detection over the system bond list.

use std::sync::Arc;

use log::warn;

use crate::platform::{BondedDeviceRegistry, PermissionAuthority};
use crate::types::{Permission, WatchStatus};
use crate::util::now_ms;

/// Device-name substrings that identify the supported watch families.
pub const DEFAULT_WATCH_PATTERNS: [&str; 3] = ["Xiaomi Watch", "Mi Watch", "Redmi Watch"];

/// Looks for a bonded smartwatch by name.
///
/// "Connected" here means present in the bond list, which is what the
/// emergency-key flow needs; a live link check would require a GATT
/// connection this layer does not hold. Registry faults degrade to
/// "no watch" rather than erroring: the callers of this type are
/// status paths where a missing answer must not break the app.
pub struct WatchDetector {
    permissions: Arc<dyn PermissionAuthority>,
    registry: Arc<dyn BondedDeviceRegistry>,
    patterns: Vec<String>,
}

impl WatchDetector {
    /// Detector matching the default watch families.
    pub fn new(
        permissions: Arc<dyn PermissionAuthority>,
        registry: Arc<dyn BondedDeviceRegistry>,
    ) -> Self {
        Self::with_patterns(permissions, registry, DEFAULT_WATCH_PATTERNS)
    }

    /// Detector matching device names against `patterns`,
    /// case-insensitively.
    pub fn with_patterns<I, S>(
        permissions: Arc<dyn PermissionAuthority>,
        registry: Arc<dyn BondedDeviceRegistry>,
        patterns: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions,
            registry,
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    /// Whether the Bluetooth adapter is powered on.
    pub fn adapter_enabled(&self) -> bool {
        self.registry.adapter_enabled()
    }

    /// Whether the bond list may be read.
    pub fn has_permission(&self) -> bool {
        self.permissions.is_granted(Permission::BluetoothConnect)
    }

    /// Name of the first bonded device matching the watch patterns.
    pub fn connected_watch(&self) -> Option<String> {
        if !self.adapter_enabled() || !self.has_permission() {
            return None;
        }
        let devices = match self.registry.bonded_devices() {
            Ok(devices) => devices,
            Err(fault) => {
                warn!("bond list unavailable: {fault}");
                return None;
            }
        };
        devices
            .into_iter()
            .filter_map(|device| device.name)
            .find(|name| self.matches(name))
    }

    pub fn is_watch_connected(&self) -> bool {
        self.connected_watch().is_some()
    }

    /// Timestamped status report for the Bluetooth channel.
    pub fn status(&self) -> WatchStatus {
        let watch_name = self.connected_watch();
        WatchStatus {
            has_permission: self.has_permission(),
            adapter_enabled: self.adapter_enabled(),
            watch_connected: watch_name.is_some(),
            watch_name,
            timestamp_ms: now_ms(),
        }
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.patterns.iter().any(|pattern| name.contains(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformFault;
    use crate::fakes::{FakeBondedRegistry, FakePermissions};
    use crate::types::BondedDevice;

    fn detector(
        registry: &Arc<FakeBondedRegistry>,
        permissions: &Arc<FakePermissions>,
    ) -> WatchDetector {
        WatchDetector::new(Arc::clone(permissions) as _, Arc::clone(registry) as _)
    }

    fn ready_registry(names: &[&str]) -> Arc<FakeBondedRegistry> {
        let registry = FakeBondedRegistry::new();
        registry.set_enabled(true);
        registry.set_devices(names.iter().map(|n| BondedDevice::named(*n)).collect());
        registry
    }

    #[test]
    fn finds_watch_case_insensitively() {
        let registry = ready_registry(&["JBL Speaker", "xiaomi watch S1"]);
        let permissions = FakePermissions::granting(&[Permission::BluetoothConnect]);
        let detector = detector(&registry, &permissions);
        assert_eq!(detector.connected_watch().as_deref(), Some("xiaomi watch S1"));
        assert!(detector.is_watch_connected());
    }

    #[test]
    fn no_match_without_adapter_or_permission() {
        let registry = ready_registry(&["Mi Watch Lite"]);
        let permissions = FakePermissions::granting(&[Permission::BluetoothConnect]);
        registry.set_enabled(false);
        assert!(!detector(&registry, &permissions).is_watch_connected());

        registry.set_enabled(true);
        let ungrant = FakePermissions::new();
        assert!(!detector(&registry, &ungrant).is_watch_connected());
    }

    #[test]
    fn nameless_devices_never_match() {
        let registry = FakeBondedRegistry::new();
        registry.set_enabled(true);
        registry.set_devices(vec![BondedDevice { name: None }]);
        let permissions = FakePermissions::granting(&[Permission::BluetoothConnect]);
        assert!(!detector(&registry, &permissions).is_watch_connected());
    }

    #[test]
    fn registry_fault_degrades_to_no_watch() {
        let registry = ready_registry(&["Redmi Watch 3"]);
        let permissions = FakePermissions::granting(&[Permission::BluetoothConnect]);
        registry.fail_bonded(PlatformFault::Security("bond list".into()));
        assert!(!detector(&registry, &permissions).is_watch_connected());
    }

    #[test]
    fn status_reports_all_dimensions() {
        let registry = ready_registry(&["Redmi Watch 3"]);
        let permissions = FakePermissions::granting(&[Permission::BluetoothConnect]);
        let status = detector(&registry, &permissions).status();
        assert!(status.has_permission);
        assert!(status.adapter_enabled);
        assert!(status.watch_connected);
        assert_eq!(status.watch_name.as_deref(), Some("Redmi Watch 3"));
        assert!(status.timestamp_ms > 0);
    }

    #[test]
    fn custom_patterns_override_defaults() {
        let registry = ready_registry(&["Galaxy Watch 6"]);
        let permissions = FakePermissions::granting(&[Permission::BluetoothConnect]);
        let detector = WatchDetector::with_patterns(
            permissions as _,
            registry as _,
            ["galaxy watch"],
        );
        assert!(detector.is_watch_connected());
    }
}
