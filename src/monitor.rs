//! Background monitor lifecycle.
//!
//! The counterpart of the platform's foreground service: it owns the
//! persistent status notification and reports the restart policy the
//! shell should hand back to the OS. Key events themselves are routed
//! by [`KeyEventRouter`](crate::keys::KeyEventRouter); the activity
//! receives them, not the service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::platform::StatusPresenter;
use crate::watch::WatchDetector;

/// What the OS should do with the service after its process is killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restart {
    /// Recreate the service (`START_STICKY`).
    Sticky,
    /// Let it stay dead.
    None,
}

/// Lifecycle shim for the background monitor.
pub struct MonitorService {
    watch: Arc<WatchDetector>,
    presenter: Arc<dyn StatusPresenter>,
    running: AtomicBool,
}

impl MonitorService {
    pub fn new(watch: Arc<WatchDetector>, presenter: Arc<dyn StatusPresenter>) -> Self {
        Self {
            watch,
            presenter,
            running: AtomicBool::new(false),
        }
    }

    /// Starts monitoring and publishes the status notification.
    /// Starting an already-running monitor is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("monitor already running");
            return;
        }
        info!("monitor service started");
        self.publish_status();
    }

    /// The per-start entry point the shell calls after [`start`](Self::start);
    /// logs the watch state and asks the OS to keep the service alive.
    pub fn on_start_command(&self) -> Restart {
        match self.watch.connected_watch() {
            Some(name) => info!("watch bonded: {name}"),
            None => info!("no watch bonded"),
        }
        Restart::Sticky
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("monitor service stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Re-publishes the status notification from the current watch
    /// state.
    pub fn publish_status(&self) {
        let text = match self.watch.connected_watch() {
            Some(name) => format!("Connected to {name}"),
            None => "Waiting for smartwatch".to_string(),
        };
        self.presenter.publish("SOS monitoring active", &text);
    }
}
