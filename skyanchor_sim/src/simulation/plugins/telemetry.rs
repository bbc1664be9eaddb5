// skyanchor_sim/src/simulation/plugins/telemetry.rs

//! Owns the UDP telemetry listener for the lifetime of the app.

use std::sync::Arc;

use crate::prelude::*;

/// The snapshot store shared by the listener thread and every consumer system.
#[derive(Resource, Clone, Default)]
pub struct SharedTelemetry(pub Arc<TelemetryStore>);

/// The running listener. Dropping the resource stops the receive thread.
#[derive(Resource)]
pub struct TelemetryLink(pub TelemetryListener);

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SharedTelemetry>()
            .add_systems(Startup, start_listener.in_set(SetupSet::Resources))
            .add_systems(Update, watch_listener_status.in_set(AnchorSet::Ingest))
            .add_systems(Last, stop_listener_on_exit);
    }
}

/// Binds the configured endpoint and launches the receive thread.
/// A bind failure is logged and leaves the listener `Faulted`; the app keeps running.
fn start_listener(
    mut commands: Commands,
    config: Res<ScenarioConfig>,
    telemetry: Res<SharedTelemetry>,
) {
    let mut listener = TelemetryListener::new(config.listener.clone(), telemetry.0.clone());
    match listener.start_configured() {
        Ok(addr) => info!("Listening for MAVLink telemetry on {}", addr),
        Err(e) => error!("Telemetry listener could not start: {}", e),
    }
    commands.insert_resource(TelemetryLink(listener));
}

/// Logs status transitions, in particular the move into `Faulted`.
fn watch_listener_status(link: Option<Res<TelemetryLink>>, mut last: Local<ListenerStatus>) {
    let Some(link) = link else {
        return;
    };
    let status = link.0.status();
    if status == *last {
        return;
    }
    match &status {
        ListenerStatus::Faulted(reason) => {
            error!("Telemetry listener faulted: {}", reason)
        }
        other => debug!("Telemetry listener is now {:?}", other),
    }
    *last = status;
}

fn stop_listener_on_exit(mut exits: EventReader<AppExit>, link: Option<ResMut<TelemetryLink>>) {
    if exits.read().next().is_none() {
        return;
    }
    if let Some(mut link) = link {
        link.0.stop();
        let stats = link.0.stats();
        info!(
            "Telemetry listener stopped: {} datagrams, {} messages, {} decode errors",
            stats.datagrams_received, stats.messages_published, stats.decode_errors
        );
    }
}
