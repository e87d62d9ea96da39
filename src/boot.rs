//! Boot-time restart of the monitor service.

use std::sync::Arc;

use log::{debug, info};

use crate::monitor::MonitorService;
use crate::platform::Preferences;

/// System broadcast actions the receiver reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootAction {
    BootCompleted,
    /// Vendor fast-boot variant of the boot broadcast.
    QuickBootPowerOn,
    Other,
}

impl BootAction {
    /// Maps a raw broadcast action string onto a [`BootAction`].
    pub fn from_action(action: &str) -> Self {
        match action {
            "android.intent.action.BOOT_COMPLETED" => Self::BootCompleted,
            "android.intent.action.QUICKBOOT_POWERON" => Self::QuickBootPowerOn,
            _ => Self::Other,
        }
    }
}

/// Restarts the monitor after a reboot when the user left it enabled.
pub struct BootReceiver {
    prefs: Arc<dyn Preferences>,
    monitor: Arc<MonitorService>,
}

impl BootReceiver {
    pub fn new(prefs: Arc<dyn Preferences>, monitor: Arc<MonitorService>) -> Self {
        Self { prefs, monitor }
    }

    /// Handles a broadcast; returns whether the monitor was started.
    pub fn on_receive(&self, action: BootAction) -> bool {
        if !matches!(
            action,
            BootAction::BootCompleted | BootAction::QuickBootPowerOn
        ) {
            return false;
        }
        if !self.prefs.monitoring_enabled() {
            debug!("monitoring disabled, not restarting after boot");
            return false;
        }
        info!("boot completed, restarting monitor service");
        self.monitor.start();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeBondedRegistry, FakePermissions, FakePreferences, FakePresenter};
    use crate::watch::WatchDetector;

    fn receiver(monitoring: bool) -> (BootReceiver, Arc<MonitorService>) {
        let registry = FakeBondedRegistry::new();
        let permissions = FakePermissions::new();
        let watch = Arc::new(WatchDetector::new(permissions as _, registry as _));
        let monitor = Arc::new(MonitorService::new(watch, FakePresenter::new() as _));
        let prefs = FakePreferences::new(monitoring);
        (
            BootReceiver::new(prefs as _, Arc::clone(&monitor)),
            monitor,
        )
    }

    #[test]
    fn boot_with_monitoring_enabled_starts_the_monitor() {
        let (receiver, monitor) = receiver(true);
        assert!(receiver.on_receive(BootAction::BootCompleted));
        assert!(monitor.is_running());
    }

    #[test]
    fn quickboot_counts_as_boot() {
        let (receiver, monitor) = receiver(true);
        assert!(receiver.on_receive(BootAction::QuickBootPowerOn));
        assert!(monitor.is_running());
    }

    #[test]
    fn boot_with_monitoring_disabled_does_nothing() {
        let (receiver, monitor) = receiver(false);
        assert!(!receiver.on_receive(BootAction::BootCompleted));
        assert!(!monitor.is_running());
    }

    #[test]
    fn unrelated_actions_are_ignored() {
        let (receiver, monitor) = receiver(true);
        assert!(!receiver.on_receive(BootAction::Other));
        assert!(!monitor.is_running());
    }

    #[test]
    fn action_strings_map_to_variants() {
        assert_eq!(
            BootAction::from_action("android.intent.action.BOOT_COMPLETED"),
            BootAction::BootCompleted
        );
        assert_eq!(
            BootAction::from_action("android.intent.action.QUICKBOOT_POWERON"),
            BootAction::QuickBootPowerOn
        );
        assert_eq!(
            BootAction::from_action("android.intent.action.AIRPLANE_MODE"),
            BootAction::Other
        );
    }
}
