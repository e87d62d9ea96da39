//! Request/response bridge toward the application layer.
//!
//! The application shell speaks to the platform layer through named
//! method calls carrying a request id; every id receives exactly one
//! response. Events that originate on the platform side (emergency
//! triggers) flow the other way as a stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task;

use async_lock::Mutex;
use futures_core::Stream;
use log::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, ErrorKind};
use crate::location::LocationEngine;
use crate::monitor::MonitorService;
use crate::onceshot::{Completion, Notifier, NotifierReceiver};
use crate::platform::{PermissionAuthority, SystemSettings};
use crate::types::{Permission, Position, SosTrigger, WatchStatus};
use crate::watch::WatchDetector;
use crate::Result;

/// One call from the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    pub id: Uuid,
    pub call: MethodCall,
}

impl Request {
    /// A request with a fresh id.
    pub fn new(call: MethodCall) -> Self {
        Self {
            id: Uuid::new_v4(),
            call,
        }
    }
}

/// The bridge's method surface, one variant per wire method.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MethodCall {
    CurrentLocation,
    HasLocationPermission,
    RequestLocationPermission,
    LocationEnabled,
    OpenLocationSettings,
    BluetoothStatus,
    HasBluetoothPermission,
    RequestBluetoothPermission,
    BluetoothEnabled,
    WatchConnected,
    StartMonitor,
    StopMonitor,
}

impl MethodCall {
    /// Resolves a wire method name. Names are the bridge protocol and
    /// must stay stable.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "getCurrentLocation" => Self::CurrentLocation,
            "hasLocationPermission" => Self::HasLocationPermission,
            "requestLocationPermission" => Self::RequestLocationPermission,
            "isLocationEnabled" => Self::LocationEnabled,
            "openLocationSettings" => Self::OpenLocationSettings,
            "getBluetoothStatus" => Self::BluetoothStatus,
            "hasBluetoothPermission" => Self::HasBluetoothPermission,
            "requestBluetoothPermission" => Self::RequestBluetoothPermission,
            "isBluetoothEnabled" => Self::BluetoothEnabled,
            "isWatchConnected" => Self::WatchConnected,
            "startMonitor" => Self::StartMonitor,
            "stopMonitor" => Self::StopMonitor,
            _ => return None,
        })
    }
}

/// Successful payload of a [`Response`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reply {
    Location(Position),
    Bool(bool),
    Watch(WatchStatus),
    Done,
}

/// Error payload of a [`Response`], in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl From<Error> for ErrorPayload {
    fn from(err: Error) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// The single answer to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
    pub id: Uuid,
    pub result: Result<Reply, ErrorPayload>,
}

/// Events pushed to the application layer without a request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BridgeEvent {
    Sos(SosTrigger),
}

/// Stream of [`BridgeEvent`]s for the application layer.
pub struct BridgeEvents {
    triggers: NotifierReceiver<SosTrigger>,
}

impl BridgeEvents {
    pub async fn recv(&mut self) -> Option<BridgeEvent> {
        self.triggers.recv().await.map(BridgeEvent::Sos)
    }
}

impl Stream for BridgeEvents {
    type Item = BridgeEvent;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<Option<Self::Item>> {
        Pin::new(&mut self.triggers)
            .poll_next(cx)
            .map(|item| item.map(BridgeEvent::Sos))
    }
}

/// Server side of the bridge: dispatches requests to the location
/// engine, the watch detector and the monitor service, and forwards
/// platform events outward.
pub struct BridgeHost {
    engine: LocationEngine,
    watch: Arc<WatchDetector>,
    monitor: Arc<MonitorService>,
    permissions: Arc<dyn PermissionAuthority>,
    settings: Arc<dyn SystemSettings>,
    triggers: Arc<Notifier<SosTrigger>>,
    // Single prompt slot, as the OS shows one permission dialog at a
    // time; concurrent requests share its outcome.
    pending_permission: Mutex<Option<Arc<Completion<bool>>>>,
}

impl BridgeHost {
    pub fn new(
        engine: LocationEngine,
        watch: Arc<WatchDetector>,
        monitor: Arc<MonitorService>,
        permissions: Arc<dyn PermissionAuthority>,
        settings: Arc<dyn SystemSettings>,
        triggers: Arc<Notifier<SosTrigger>>,
    ) -> Self {
        Self {
            engine,
            watch,
            monitor,
            permissions,
            settings,
            triggers,
            pending_permission: Mutex::new(None),
        }
    }

    /// Answers one request. Always produces exactly one [`Response`]
    /// carrying the request's id.
    pub async fn handle(&self, request: Request) -> Response {
        let Request { id, call } = request;
        debug!("dispatching {call:?} for request {id}");
        let result = self.dispatch(call).await.map_err(ErrorPayload::from);
        Response { id, result }
    }

    /// Answers a request given by wire method name; unknown names get
    /// an [`ErrorKind::UnknownMethod`] response.
    pub async fn handle_named(&self, id: Uuid, name: &str) -> Response {
        match MethodCall::from_name(name) {
            Some(call) => self.handle(Request { id, call }).await,
            None => {
                warn!("unimplemented bridge method {name:?}");
                Response {
                    id,
                    result: Err(ErrorPayload::from(Error::from(ErrorKind::UnknownMethod))),
                }
            }
        }
    }

    /// Serves requests until the request channel closes, answering each
    /// on `responses`.
    pub async fn serve(
        &self,
        requests: async_channel::Receiver<Request>,
        responses: async_channel::Sender<Response>,
    ) -> Result<()> {
        while let Ok(request) = requests.recv().await {
            let response = self.handle(request).await;
            if responses.send(response).await.is_err() {
                return Err(ErrorKind::ChannelClosed.into());
            }
        }
        Ok(())
    }

    /// Stream of platform-originated events for the application layer.
    pub fn events(&self) -> BridgeEvents {
        BridgeEvents {
            triggers: self.triggers.subscribe(),
        }
    }

    /// Completion callback for the OS permission prompt; settles every
    /// request waiting on it.
    pub fn on_permission_result(&self, granted: bool) {
        match self.pending_permission.lock_blocking().take() {
            Some(completion) => {
                completion.complete(granted);
            }
            None => warn!("permission result with no pending request"),
        }
    }

    async fn dispatch(&self, call: MethodCall) -> Result<Reply> {
        match call {
            MethodCall::CurrentLocation => {
                Ok(Reply::Location(self.engine.current_location().await?))
            }
            MethodCall::HasLocationPermission => Ok(Reply::Bool(self.engine.has_permission())),
            MethodCall::RequestLocationPermission => {
                let granted = self
                    .request_permission(
                        &[Permission::FineLocation, Permission::CoarseLocation],
                        self.engine.has_permission(),
                    )
                    .await?;
                Ok(Reply::Bool(granted))
            }
            MethodCall::LocationEnabled => Ok(Reply::Bool(self.engine.any_provider_enabled())),
            MethodCall::OpenLocationSettings => {
                self.settings.open_location_settings();
                Ok(Reply::Done)
            }
            MethodCall::BluetoothStatus => Ok(Reply::Watch(self.watch.status())),
            MethodCall::HasBluetoothPermission => Ok(Reply::Bool(self.watch.has_permission())),
            MethodCall::RequestBluetoothPermission => {
                let granted = self
                    .request_permission(
                        &[Permission::BluetoothConnect, Permission::BluetoothScan],
                        self.watch.has_permission(),
                    )
                    .await?;
                Ok(Reply::Bool(granted))
            }
            MethodCall::BluetoothEnabled => Ok(Reply::Bool(self.watch.adapter_enabled())),
            MethodCall::WatchConnected => Ok(Reply::Bool(self.watch.is_watch_connected())),
            MethodCall::StartMonitor => {
                self.monitor.start();
                Ok(Reply::Done)
            }
            MethodCall::StopMonitor => {
                self.monitor.stop();
                Ok(Reply::Done)
            }
        }
    }

    async fn request_permission(&self, wanted: &[Permission], already: bool) -> Result<bool> {
        if already {
            return Ok(true);
        }
        let completion = {
            let mut pending = self.pending_permission.lock().await;
            if let Some(pending) = pending.as_ref() {
                // a prompt is already on screen; share its outcome
                Arc::clone(pending)
            } else {
                self.permissions
                    .begin_request(wanted)
                    .map_err(Error::from)?;
                let completion = Completion::new();
                pending.replace(Arc::clone(&completion));
                completion
            }
        };
        Ok(completion.wait().await)
    }
}
