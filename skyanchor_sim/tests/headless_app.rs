// skyanchor_sim/tests/headless_app.rs

//! Runs the whole plugin stack headless, fed by the in-app emitter.

use approx::assert_abs_diff_eq;
use bevy::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use skyanchor_sim::prelude::{GeoreferenceOrigin, GlobeAnchor, ScenarioConfig};
use skyanchor_sim::simulation::plugins::telemetry::TelemetryLink;
use skyanchor_sim::SkyAnchorPlugin;

fn loopback_scenario() -> ScenarioConfig {
    let mut config = ScenarioConfig::default();
    config.listener.bind_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.listener.port = 0;
    config.listener.receive_timeout = Duration::from_millis(50);
    config.origin.initialization_delay = Duration::ZERO;
    config.terrain.elevation = 410.0;
    config.terrain.load_time = Duration::ZERO;
    config.terrain.query_latency = Duration::ZERO;
    config.emitter.enabled = true;
    config.emitter.rate_hz = 50.0;
    config.emitter.seed = Some(7);
    config
}

fn anchor(app: &mut App) -> GlobeAnchor {
    let world = app.world_mut();
    let mut anchors = world.query::<&GlobeAnchor>();
    anchors.single(world).unwrap().clone()
}

#[test]
fn emitted_orbit_reaches_the_globe_anchor() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(loopback_scenario())
        .add_plugins(SkyAnchorPlugin);

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        app.update();
        if anchor(&mut app).updates >= 3 {
            break;
        }
        assert!(Instant::now() < deadline, "anchor never received a pose");
        std::thread::sleep(Duration::from_millis(10));
    }

    let link = app.world().resource::<TelemetryLink>();
    assert!(link.0.is_running());
    assert!(link.0.stats().messages_published > 0);

    let origin = app.world().resource::<GeoreferenceOrigin>().0.unwrap();
    assert_abs_diff_eq!(origin.height, 2250.0);
    assert_abs_diff_eq!(origin.latitude, 47.3977, epsilon = 0.01);

    // Relative altitude 60 m on top of 410 m terrain.
    let placed = anchor(&mut app);
    assert_abs_diff_eq!(placed.position.latitude, 47.3977, epsilon = 0.01);
    assert_abs_diff_eq!(placed.position.longitude, 8.5456, epsilon = 0.01);
    assert_abs_diff_eq!(placed.position.height, 470.0, epsilon = 1.0);
}

#[test]
fn duration_limit_exits_the_app() {
    let mut config = loopback_scenario();
    config.emitter.enabled = false;
    config.simulation.duration_seconds = Some(0.05);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(config)
        .add_plugins(SkyAnchorPlugin);

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        app.update();
        if app.should_exit().is_some() {
            break;
        }
        assert!(Instant::now() < deadline, "app never requested exit");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(matches!(app.should_exit(), Some(AppExit::Success)));
}
