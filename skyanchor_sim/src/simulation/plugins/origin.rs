// skyanchor_sim/src/simulation/plugins/origin.rs

//! Places the georeference origin at the first valid position fix.

use std::time::Instant;

use crate::prelude::*;
use crate::simulation::plugins::telemetry::SharedTelemetry;

/// The placed georeference origin. This is the host's origin sink.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct GeoreferenceOrigin(pub Option<GeoPosition>);

impl OriginSink for GeoreferenceOrigin {
    fn place_origin(&mut self, position: GeoPosition) {
        self.0 = Some(position);
    }
}

/// Drives the [`OriginInitializer`]. Its signal is what anchors wait on.
#[derive(Resource)]
pub struct OriginState(pub OriginInitializer);

pub struct OriginPlugin;

impl Plugin for OriginPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GeoreferenceOrigin>()
            .add_systems(Startup, setup_origin.in_set(SetupSet::Resources))
            .add_systems(Update, place_origin.in_set(AnchorSet::Origin));
    }
}

fn setup_origin(mut commands: Commands, config: Res<ScenarioConfig>) {
    commands.insert_resource(OriginState(OriginInitializer::new(config.origin.clone())));
}

fn place_origin(
    state: Option<ResMut<OriginState>>,
    telemetry: Res<SharedTelemetry>,
    mut origin: ResMut<GeoreferenceOrigin>,
) {
    let Some(mut state) = state else {
        return;
    };
    if state.0.placed().is_some() {
        return;
    }
    let sample = telemetry.0.read();
    state.0.tick(Instant::now(), &sample, &mut *origin);
}
