//! Emergency key routing.
//!
//! The watch maps its SOS gesture onto a Volume-Up key press of the
//! paired phone. The router turns that press into an emergency trigger
//! for the application layer, but only while a watch is actually
//! bonded: without one, volume keys must keep doing what volume keys
//! do.

use std::sync::Arc;

use log::{debug, info};

use crate::onceshot::Notifier;
use crate::types::{KeyCode, KeyDisposition, SosTrigger};
use crate::util::now_ms;
use crate::watch::WatchDetector;

pub const TRIGGER_SOURCE_SMARTWATCH: &str = "smartwatch";

/// Routes hardware key events forwarded by the activity.
pub struct KeyEventRouter {
    watch: Arc<WatchDetector>,
    triggers: Arc<Notifier<SosTrigger>>,
}

impl KeyEventRouter {
    pub fn new(watch: Arc<WatchDetector>, triggers: Arc<Notifier<SosTrigger>>) -> Self {
        Self { watch, triggers }
    }

    /// Handles a key-down event. Volume-Up with a bonded watch raises
    /// an emergency trigger and consumes the event so the system volume
    /// is left alone; everything else passes through.
    pub fn on_key_down(&self, key: KeyCode) -> KeyDisposition {
        debug!("key pressed: {key:?}");
        if key != KeyCode::VolumeUp {
            return KeyDisposition::Pass;
        }
        let Some(device) = self.watch.connected_watch() else {
            return KeyDisposition::Pass;
        };
        info!("emergency key from {device}");
        self.triggers.notify(SosTrigger {
            source: TRIGGER_SOURCE_SMARTWATCH.to_string(),
            device,
            timestamp_ms: now_ms(),
        });
        KeyDisposition::Consumed
    }
}
