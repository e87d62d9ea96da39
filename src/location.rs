//! Best-effort device location acquisition.
//!
//! The engine serves a request from the cheapest source it can: a
//! cached provider fix when one exists, otherwise a one-shot live fix
//! bounded by a timeout. All failures surface as one of the
//! [`ErrorKind`] categories; none are fatal and no retries happen here,
//! the caller decides whether to reissue.

use std::sync::Arc;
use std::time::Duration;

use async_lock::Mutex;
use futures_lite::FutureExt;
use futures_timer::Delay;
use log::{debug, warn};

use crate::error::{Error, ErrorKind, PlatformFault};
use crate::onceshot::Completion;
use crate::platform::{LocationServices, PermissionAuthority, UpdateSink};
use crate::types::{Permission, Position, Provider};
use crate::util::on_drop;
use crate::Result;

/// Tuning knobs for [`LocationEngine`].
#[derive(Debug, Clone)]
pub struct LocationConfig {
    /// How long a live fix request may wait for its first update before
    /// failing with [`ErrorKind::Timeout`].
    pub live_fix_timeout: Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            live_fix_timeout: Duration::from_millis(10_000),
        }
    }
}

/// Acquires the device position through the injected
/// [`LocationServices`].
///
/// A request runs in two phases. Phase 1 queries the last-known-fix
/// store synchronously, GPS before network; a hit is returned without
/// touching the sensor. Phase 2 subscribes for live updates on the
/// preferred enabled provider and races the first update against the
/// configured timeout; whichever fires first settles the request, the
/// loser is cancelled, and the subscription is removed on every exit
/// path exactly once.
pub struct LocationEngine {
    permissions: Arc<dyn PermissionAuthority>,
    services: Arc<dyn LocationServices>,
    config: LocationConfig,
    // One live subscription at a time; a queued caller runs its own
    // full cycle once the current one settles.
    live_serial: Mutex<()>,
}

impl LocationEngine {
    pub fn new(
        permissions: Arc<dyn PermissionAuthority>,
        services: Arc<dyn LocationServices>,
    ) -> Self {
        Self::with_config(permissions, services, LocationConfig::default())
    }

    pub fn with_config(
        permissions: Arc<dyn PermissionAuthority>,
        services: Arc<dyn LocationServices>,
        config: LocationConfig,
    ) -> Self {
        Self {
            permissions,
            services,
            config,
            live_serial: Mutex::new(()),
        }
    }

    /// Whether fine or coarse location permission is granted.
    pub fn has_permission(&self) -> bool {
        self.permissions.is_granted(Permission::FineLocation)
            || self.permissions.is_granted(Permission::CoarseLocation)
    }

    /// Whether any location provider is enabled in the device settings.
    pub fn any_provider_enabled(&self) -> bool {
        Provider::PREFERENCE
            .iter()
            .any(|&provider| self.services.is_enabled(provider))
    }

    /// Returns the current device position.
    ///
    /// Fails with [`ErrorKind::PermissionDenied`] when no location
    /// permission is granted, [`ErrorKind::ProviderDisabled`] when no
    /// provider is enabled, [`ErrorKind::NoProviderAvailable`] when the
    /// provider disappears before the live subscription is placed,
    /// [`ErrorKind::Timeout`] when no live fix arrives in time, and
    /// [`ErrorKind::SecurityFault`] when the OS revokes the permission
    /// mid-flight.
    pub async fn current_location(&self) -> Result<Position> {
        if !self.has_permission() {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                None,
                "location permission not granted",
            ));
        }
        if !self.any_provider_enabled() {
            return Err(Error::new(
                ErrorKind::ProviderDisabled,
                None,
                "no location provider enabled",
            ));
        }

        if let Some(fix) = self.cached_fix()? {
            debug!("serving cached fix {fix}");
            return Ok(fix);
        }
        self.live_fix().await
    }

    /// Phase 1: last-known fix, GPS before network, no sensor
    /// activation.
    fn cached_fix(&self) -> Result<Option<Position>> {
        for provider in Provider::PREFERENCE {
            if !self.services.is_enabled(provider) {
                continue;
            }
            if let Some(fix) = self.services.last_known(provider).map_err(Error::from)? {
                return Ok(Some(fix));
            }
        }
        Ok(None)
    }

    /// Phase 2: one-shot live fix bounded by the configured timeout.
    async fn live_fix(&self) -> Result<Position> {
        let _serial = self.live_serial.lock().await;

        let provider = Provider::PREFERENCE
            .into_iter()
            .find(|&provider| self.services.is_enabled(provider))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::NoProviderAvailable,
                    None,
                    "no location provider available",
                )
            })?;

        let completion = Completion::<Position>::new();
        let sink: UpdateSink = {
            let completion = Arc::clone(&completion);
            Arc::new(move |fix: Position| {
                if !completion.complete(fix) {
                    debug!("dropping location update for a settled request");
                }
            })
        };

        let handle = match self.services.request_updates(provider, sink) {
            Ok(handle) => handle,
            Err(fault @ PlatformFault::Security(_)) => return Err(fault.into()),
            Err(fault) => {
                return Err(Error::new(
                    ErrorKind::NoProviderAvailable,
                    Some(fault),
                    "provider went away before subscribing",
                ))
            }
        };
        // Teardown is tied to this guard so the subscription is removed
        // on every exit path below, exactly once.
        let services = Arc::clone(&self.services);
        let _teardown = on_drop(move || services.remove_updates(handle));

        debug!(
            "waiting for a live {provider} fix, limit {:?}",
            self.config.live_fix_timeout
        );
        let outcome = async { Ok(completion.wait().await) }
            .or(async {
                Delay::new(self.config.live_fix_timeout).await;
                Err(Error::new(
                    ErrorKind::Timeout,
                    None,
                    "location request timed out",
                ))
            })
            .await;
        // Seal the cell so a late update cannot look like a second
        // result; a no-op when the update already won.
        completion.close();
        if outcome.is_err() {
            warn!("no {provider} fix within {:?}", self.config.live_fix_timeout);
        }
        outcome
    }
}
