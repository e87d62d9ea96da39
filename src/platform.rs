//! Injected operating-system interfaces.
//!
//! The bridge never reaches into platform handles directly; every OS
//! facility it needs is behind one of these traits, wired in by the
//! embedding shell (a JNI layer, a test fake, a simulator). This keeps
//! the acquisition and dispatch logic portable and fully exercisable
//! in-process.

use std::sync::Arc;

use crate::error::PlatformFault;
use crate::types::{BondedDevice, Permission, Position, Provider};

/// Callback receiving live position updates from the platform.
///
/// The platform may invoke it from any thread; implementations on the
/// bridge side must be safe against late and duplicate invocations.
pub type UpdateSink = Arc<dyn Fn(Position) + Send + Sync>;

/// Opaque handle for an active location-update subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// The OS permission authority.
pub trait PermissionAuthority: Send + Sync {
    /// Whether `permission` is granted right now.
    fn is_granted(&self, permission: Permission) -> bool;

    /// Fires the OS permission prompt for `permissions`. The grant
    /// result arrives later through the host's permission-result
    /// callback; this call only starts the flow.
    fn begin_request(&self, permissions: &[Permission]) -> Result<(), PlatformFault>;
}

/// The platform location subsystem: provider status, the last-known-fix
/// store and the live update source.
pub trait LocationServices: Send + Sync {
    /// Whether `provider` is enabled in the device settings.
    fn is_enabled(&self, provider: Provider) -> bool;

    /// The provider's cached fix, if it holds one. Does not activate
    /// the sensor.
    fn last_known(&self, provider: Provider) -> Result<Option<Position>, PlatformFault>;

    /// Starts delivering live updates from `provider` to `sink`, with
    /// no minimum time or distance filter: the first update of any
    /// precision is expected.
    fn request_updates(
        &self,
        provider: Provider,
        sink: UpdateSink,
    ) -> Result<SubscriptionHandle, PlatformFault>;

    /// Stops a subscription. Removing an already-removed subscription
    /// must be a no-op, never an error.
    fn remove_updates(&self, handle: SubscriptionHandle);
}

/// The system Bluetooth adapter's bond list.
pub trait BondedDeviceRegistry: Send + Sync {
    /// Whether the Bluetooth adapter is powered on.
    fn adapter_enabled(&self) -> bool;

    /// All currently bonded devices.
    fn bonded_devices(&self) -> Result<Vec<BondedDevice>, PlatformFault>;
}

/// Persistent user preferences backing the boot receiver.
pub trait Preferences: Send + Sync {
    /// Whether the user enabled background monitoring.
    fn monitoring_enabled(&self) -> bool;
}

/// The foreground notification surface of the monitor service.
///
/// Notification channel registration and the actual notification
/// construction live in the embedding shell.
pub trait StatusPresenter: Send + Sync {
    fn publish(&self, title: &str, text: &str);
}

/// System settings screens the app can send the user to.
pub trait SystemSettings: Send + Sync {
    fn open_location_settings(&self);
}
