//! End-to-end bridge flows over fake platform services: the same
//! request/response traffic a mobile shell would generate, from cold
//! start through an emergency trigger.

use std::sync::Arc;
use std::time::Duration;

use futures_lite::future::block_on;

use sos_bridge::fakes::{
    FakeBondedRegistry, FakeLocationServices, FakePermissions, FakePreferences, FakePresenter,
    FakeSettings,
};
use sos_bridge::{
    BootAction, BootReceiver, BridgeEvent, BridgeHost, KeyCode, KeyDisposition, KeyEventRouter,
    LocationConfig, LocationEngine, MethodCall, MonitorService, Notifier, Permission, Position,
    Provider, Reply, Request, WatchDetector,
};

struct World {
    host: BridgeHost,
    router: KeyEventRouter,
    boot: BootReceiver,
    permissions: Arc<FakePermissions>,
    services: Arc<FakeLocationServices>,
    registry: Arc<FakeBondedRegistry>,
    prefs: Arc<FakePreferences>,
    presenter: Arc<FakePresenter>,
    monitor: Arc<MonitorService>,
}

fn world() -> World {
    let permissions = FakePermissions::new();
    let services = FakeLocationServices::new();
    let registry = FakeBondedRegistry::new();
    let prefs = FakePreferences::new(false);
    let presenter = FakePresenter::new();
    let settings = FakeSettings::new();
    let triggers = Arc::new(Notifier::new(8));

    let engine = LocationEngine::with_config(
        Arc::clone(&permissions) as _,
        Arc::clone(&services) as _,
        LocationConfig {
            live_fix_timeout: Duration::from_millis(200),
        },
    );
    let watch = Arc::new(WatchDetector::new(
        Arc::clone(&permissions) as _,
        Arc::clone(&registry) as _,
    ));
    let monitor = Arc::new(MonitorService::new(
        Arc::clone(&watch),
        Arc::clone(&presenter) as _,
    ));
    let router = KeyEventRouter::new(Arc::clone(&watch), Arc::clone(&triggers));
    let boot = BootReceiver::new(Arc::clone(&prefs) as _, Arc::clone(&monitor));
    let host = BridgeHost::new(
        engine,
        watch,
        Arc::clone(&monitor),
        Arc::clone(&permissions) as _,
        settings as _,
        triggers,
    );

    World {
        host,
        router,
        boot,
        permissions,
        services,
        registry,
        prefs,
        presenter,
        monitor,
    }
}

fn call(world: &World, call: MethodCall) -> sos_bridge::Response {
    block_on(world.host.handle(Request::new(call)))
}

#[test]
fn cold_start_to_first_fix() {
    let world = world();

    // the shell probes state first
    assert_eq!(
        call(&world, MethodCall::HasLocationPermission).result,
        Ok(Reply::Bool(false))
    );
    assert_eq!(
        call(&world, MethodCall::CurrentLocation)
            .result
            .unwrap_err()
            .code,
        "PERMISSION_DENIED"
    );

    // user grants the permission through the prompt
    world.permissions.grant(Permission::FineLocation);
    world.services.enable(Provider::Gps);

    // no cached fix yet: the live path answers within the bound
    world
        .services
        .deliver_live(Position::new(3.0, 4.0), Duration::from_millis(20));
    assert_eq!(
        call(&world, MethodCall::CurrentLocation).result,
        Ok(Reply::Location(Position::new(3.0, 4.0)))
    );
    assert_eq!(world.services.subscribe_count(), 1);
    assert_eq!(world.services.remove_count(), 1);

    // once the platform caches a fix, no further live request is made
    world
        .services
        .set_cached(Provider::Gps, Some(Position::new(3.5, 4.5)));
    assert_eq!(
        call(&world, MethodCall::CurrentLocation).result,
        Ok(Reply::Location(Position::new(3.5, 4.5)))
    );
    assert_eq!(world.services.subscribe_count(), 1);
}

#[test]
fn watch_pairing_and_emergency_flow() {
    let world = world();
    world.permissions.grant(Permission::BluetoothConnect);
    world.registry.set_enabled(true);

    assert_eq!(
        call(&world, MethodCall::WatchConnected).result,
        Ok(Reply::Bool(false))
    );
    // the key is not stolen while no watch is bonded
    assert_eq!(world.router.on_key_down(KeyCode::VolumeUp), KeyDisposition::Pass);

    world
        .registry
        .set_devices(vec![sos_bridge::BondedDevice::named("Xiaomi Watch S1")]);
    assert_eq!(
        call(&world, MethodCall::WatchConnected).result,
        Ok(Reply::Bool(true))
    );

    let mut events = world.host.events();
    assert_eq!(
        world.router.on_key_down(KeyCode::VolumeUp),
        KeyDisposition::Consumed
    );
    match block_on(events.recv()) {
        Some(BridgeEvent::Sos(trigger)) => {
            assert_eq!(trigger.source, "smartwatch");
            assert_eq!(trigger.device, "Xiaomi Watch S1");
        }
        other => panic!("expected an SOS event, got {other:?}"),
    }
}

#[test]
fn reboot_restores_monitoring_and_notification() {
    let world = world();
    world.permissions.grant(Permission::BluetoothConnect);
    world.registry.set_enabled(true);
    world
        .registry
        .set_devices(vec![sos_bridge::BondedDevice::named("Mi Watch Lite")]);

    // monitoring was never enabled: boot does nothing
    assert!(!world.boot.on_receive(BootAction::BootCompleted));
    assert!(!world.monitor.is_running());

    // user turns monitoring on and the device reboots
    world.prefs.set_monitoring(true);
    assert!(world.boot.on_receive(BootAction::BootCompleted));
    assert!(world.monitor.is_running());
    let published = world.presenter.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1, "Connected to Mi Watch Lite");
}

#[test]
fn serve_loop_answers_a_request_burst() {
    let world = world();
    world.permissions.grant(Permission::FineLocation);
    world.services.enable(Provider::Network);
    world
        .services
        .set_cached(Provider::Network, Some(Position::new(5.0, 6.0)));

    let (req_tx, req_rx) = async_channel::unbounded();
    let (resp_tx, resp_rx) = async_channel::unbounded();
    let requests = vec![
        Request::new(MethodCall::HasLocationPermission),
        Request::new(MethodCall::LocationEnabled),
        Request::new(MethodCall::CurrentLocation),
        Request::new(MethodCall::BluetoothEnabled),
    ];
    for request in &requests {
        block_on(req_tx.send(request.clone())).unwrap();
    }
    drop(req_tx);

    block_on(world.host.serve(req_rx, resp_tx)).unwrap();

    let responses: Vec<_> = std::iter::from_fn(|| resp_rx.try_recv().ok()).collect();
    assert_eq!(responses.len(), requests.len());
    for (request, response) in requests.iter().zip(&responses) {
        assert_eq!(request.id, response.id);
    }
    assert_eq!(
        responses[2].result,
        Ok(Reply::Location(Position::new(5.0, 6.0)))
    );
}
