// skyanchor_sim/src/simulation/plugins/debugging/systems.rs

use bevy::prelude::*;
use std::collections::HashMap;

use super::ReportTimer;
use crate::prelude::*;
use crate::simulation::plugins::anchor::{AnchorDriver, GlobeAnchor};
use crate::simulation::plugins::origin::GeoreferenceOrigin;
use crate::simulation::plugins::telemetry::{SharedTelemetry, TelemetryLink};

pub fn setup_report_timer(mut commands: Commands, config: Res<ScenarioConfig>) {
    commands.insert_resource(ReportTimer(Timer::new(
        config.simulation.report_interval,
        TimerMode::Repeating,
    )));
}

// =========================================================================
// == Logging Systems ==
// =========================================================================

/// Logs each anchor's initialization state whenever it changes.
pub fn log_anchor_transitions(
    anchors: Query<(Entity, &Name, &AnchorDriver)>,
    mut seen: Local<HashMap<Entity, InitializationState>>,
) {
    for (entity, name, driver) in &anchors {
        let state = driver.0.state();
        if seen.insert(entity, state) != Some(state) {
            match driver.0.sequencer().waiting_on() {
                Some(gate) => info!("[Anchor '{}'] {:?}, waiting for {}", name, state, gate),
                None => info!("[Anchor '{}'] {:?}", name, state),
            }
        }
    }
}

/// Periodic summary of the whole pipeline.
pub fn report_status(
    time: Res<Time>,
    timer: Option<ResMut<ReportTimer>>,
    link: Option<Res<TelemetryLink>>,
    telemetry: Res<SharedTelemetry>,
    origin: Res<GeoreferenceOrigin>,
    anchors: Query<(&Name, &AnchorDriver, &GlobeAnchor)>,
) {
    let Some(mut timer) = timer else {
        return;
    };
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }

    if let Some(link) = link {
        let stats = link.0.stats();
        info!(
            "[Telemetry] {:?}: {} datagrams, {} published, {} ignored, {} decode errors",
            link.0.status(),
            stats.datagrams_received,
            stats.messages_published,
            stats.messages_ignored,
            stats.decode_errors
        );
    }

    let sample = telemetry.0.read();
    if sample.has_position() {
        debug!(
            "[Telemetry] lat {:.7} lon {:.7} alt {:.1} m | roll {:.3} pitch {:.3} yaw {:.3} | \"{}\"",
            sample.latitude(),
            sample.longitude(),
            sample.relative_altitude(),
            sample.roll(),
            sample.pitch(),
            sample.yaw(),
            sample.status_text()
        );
    }

    match origin.0 {
        Some(o) => debug!(
            "[Origin] lon {:.7} lat {:.7} h {:.1}",
            o.longitude, o.latitude, o.height
        ),
        None => debug!("[Origin] not placed"),
    }

    for (name, driver, anchor) in &anchors {
        if driver.0.pose_state().is_some() {
            let (roll, pitch, yaw) = anchor.orientation.euler_angles();
            info!(
                "[Anchor '{}'] lon {:.7} lat {:.7} h {:.2} m | euler ({:.3}, {:.3}, {:.3}) | {} updates",
                name,
                anchor.position.longitude,
                anchor.position.latitude,
                anchor.position.height,
                roll,
                pitch,
                yaw,
                anchor.updates
            );
        } else {
            info!("[Anchor '{}'] {:?}", name, driver.0.state());
        }
    }
}
