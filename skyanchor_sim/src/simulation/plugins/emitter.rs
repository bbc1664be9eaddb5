// skyanchor_sim/src/simulation/plugins/emitter.rs

//! Optional in-app telemetry source, aimed at the app's own listener.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::prelude::*;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::emitter::TelemetryEmitter;
use crate::simulation::plugins::telemetry::TelemetryLink;

#[derive(Resource)]
pub struct EmitterState {
    pub emitter: TelemetryEmitter,
    /// Elapsed app time of the next report, seconds.
    next_emit: f64,
}

pub struct EmitterPlugin;

impl Plugin for EmitterPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_emitter.in_set(SetupSet::Spawn))
            .add_systems(
                Update,
                emit_telemetry
                    .before(AnchorSet::Ingest)
                    .run_if(resource_exists::<EmitterState>),
            );
    }
}

/// Where to send: the configured target, else the listener's own address on loopback.
fn resolve_target(config: &ScenarioConfig, link: Option<&TelemetryLink>) -> SocketAddr {
    if let Some(target) = config.emitter.target {
        return target;
    }
    let bound = link
        .and_then(|link| link.0.local_addr())
        .unwrap_or_else(|| config.listener.endpoint());
    let ip = if bound.ip().is_unspecified() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        bound.ip()
    };
    SocketAddr::new(ip, bound.port())
}

fn setup_emitter(
    mut commands: Commands,
    config: Res<ScenarioConfig>,
    link: Option<Res<TelemetryLink>>,
) {
    if !config.emitter.enabled {
        return;
    }
    let target = resolve_target(&config, link.as_deref());
    match TelemetryEmitter::new(config.emitter.clone(), target) {
        Ok(emitter) => {
            commands.insert_resource(SimulationRng::from_seed(config.emitter.seed));
            commands.insert_resource(EmitterState {
                emitter,
                next_emit: 0.0,
            });
        }
        Err(e) => error!("Synthetic telemetry disabled: {}", e),
    }
}

fn emit_telemetry(time: Res<Time>, mut state: ResMut<EmitterState>, mut rng: ResMut<SimulationRng>) {
    let now = time.elapsed_secs_f64();
    if now < state.next_emit {
        return;
    }
    let period = state.emitter.period().as_secs_f64();
    let state = &mut *state;
    if let Err(e) = state.emitter.emit_at(now, &mut rng.0) {
        warn!("Failed to send synthetic telemetry: {}", e);
    }
    // Skip missed slots instead of bursting to catch up.
    while state.next_emit <= now {
        state.next_emit += period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_defaults_to_loopback_listener_port() {
        let config = ScenarioConfig::default();
        assert_eq!(
            resolve_target(&config, None),
            SocketAddr::from((Ipv4Addr::LOCALHOST, 14555))
        );
    }

    #[test]
    fn explicit_target_wins() {
        let mut config = ScenarioConfig::default();
        let target = SocketAddr::from((Ipv4Addr::new(192, 168, 1, 20), 14550));
        config.emitter.target = Some(target);
        assert_eq!(resolve_target(&config, None), target);
    }
}
