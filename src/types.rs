//! Payload types crossing the bridge between the platform layer and the
//! application layer.

/// A geographic position in WGS-84 degrees.
///
/// Altitude, accuracy and heading are intentionally not modeled; the
/// application layer only consumes coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A named source of location data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Provider {
    Gps,
    Network,
}

impl Provider {
    /// Both providers in preference order: GPS is consulted before the
    /// network provider whenever both are usable.
    pub const PREFERENCE: [Provider; 2] = [Provider::Gps, Provider::Network];
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gps => f.write_str("gps"),
            Provider::Network => f.write_str("network"),
        }
    }
}

/// Runtime permissions the bridge cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Permission {
    FineLocation,
    CoarseLocation,
    BluetoothConnect,
    BluetoothScan,
}

/// One entry of the system Bluetooth bond list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BondedDevice {
    /// Bonded devices may have no resolvable name.
    pub name: Option<String>,
}

impl BondedDevice {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Snapshot of the Bluetooth/watch state, reported over the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchStatus {
    pub has_permission: bool,
    pub adapter_enabled: bool,
    pub watch_connected: bool,
    pub watch_name: Option<String>,
    pub timestamp_ms: u64,
}

/// Emergency trigger pushed to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SosTrigger {
    /// What raised the trigger, e.g. `"smartwatch"`.
    pub source: String,
    /// Name of the device the trigger came from.
    pub device: String,
    pub timestamp_ms: u64,
}

/// Hardware key codes the activity forwards to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyCode {
    VolumeUp,
    VolumeDown,
    Other(i32),
}

/// Whether a key event was swallowed by the router or should be handed
/// back to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Consumed,
    Pass,
}
