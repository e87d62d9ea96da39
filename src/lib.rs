//! Platform-services layer for a personal-safety companion app.
//!
//! The crate wraps the operating-system facilities such an app leans on
//! (the location subsystem, the Bluetooth bond list, the permission
//! authority, the notification surface) behind injected traits
//! ([`platform`]), and implements the portable logic above them:
//! two-phase location acquisition ([`LocationEngine`]), paired-watch
//! detection ([`WatchDetector`]), the background monitor lifecycle
//! ([`MonitorService`]), boot-time restart ([`BootReceiver`]),
//! emergency key routing ([`KeyEventRouter`]) and the app-facing
//! request/response bridge ([`BridgeHost`]).
//!
//! All waiting is runtime-agnostic: platform callbacks are bridged into
//! futures with [`Completion`]/[`Notifier`], so the crate runs under any
//! executor, including a plain `block_on`. The [`fakes`] module provides
//! in-process platform services for tests and simulators.

pub use boot::{BootAction, BootReceiver};
pub use bridge::{
    BridgeEvent, BridgeEvents, BridgeHost, ErrorPayload, MethodCall, Reply, Request, Response,
};
pub use error::{Error, ErrorKind, PlatformFault};
pub use keys::{KeyEventRouter, TRIGGER_SOURCE_SMARTWATCH};
pub use location::{LocationConfig, LocationEngine};
pub use monitor::{MonitorService, Restart};
pub use onceshot::{Completion, Notifier, NotifierReceiver};
pub use watch::{WatchDetector, DEFAULT_WATCH_PATTERNS};

/// Convenience alias for a result with [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

pub use uuid::Uuid;

pub mod error;
mod types;
pub use types::*;

pub mod fakes;
pub mod platform;

mod boot;
mod bridge;
mod keys;
mod location;
mod monitor;
mod onceshot;
mod util;
mod watch;
