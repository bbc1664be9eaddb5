// skyanchor_sim/src/simulation/plugins/anchor.rs

//! Spawns the anchored objects and drives their controllers every frame.

use nalgebra::UnitQuaternion;
use std::sync::Arc;
use std::time::Instant;

use crate::prelude::*;
use crate::simulation::core::terrain::FlatTerrain;
use crate::simulation::plugins::origin::OriginState;
use crate::simulation::plugins::telemetry::SharedTelemetry;

/// The terrain dataset the anchors sample their ground height from.
#[derive(Resource, Clone)]
pub struct SharedTerrain(pub Arc<dyn TerrainDataset>);

/// Georeferenced placement of a rendered object. This is the host's anchor sink.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct GlobeAnchor {
    pub position: GeoPosition,
    /// East-up-north orientation.
    pub orientation: UnitQuaternion<f64>,
    /// Number of pose writes received.
    pub updates: u64,
}

impl Default for GlobeAnchor {
    fn default() -> Self {
        Self {
            position: GeoPosition::default(),
            orientation: UnitQuaternion::identity(),
            updates: 0,
        }
    }
}

impl AnchorSink for GlobeAnchor {
    fn set_position(&mut self, position: GeoPosition) {
        self.position = position;
        self.updates += 1;
    }

    fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = orientation;
    }
}

/// The per-object sequencer + smoother.
#[derive(Component)]
pub struct AnchorDriver(pub AnchorController);

pub struct AnchorPlugin;

impl Plugin for AnchorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_terrain.in_set(SetupSet::Resources))
            .add_systems(Startup, spawn_anchors.in_set(SetupSet::Spawn))
            .add_systems(Update, drive_anchors.in_set(AnchorSet::Anchor));
    }
}

fn setup_terrain(mut commands: Commands, config: Res<ScenarioConfig>) {
    info!(
        "Flat terrain at {} m, loading over {:?}",
        config.terrain.elevation, config.terrain.load_time
    );
    commands.insert_resource(SharedTerrain(Arc::new(FlatTerrain::new(&config.terrain))));
}

/// One entity per configured anchor. An anchor whose collaborators are missing is not spawned.
fn spawn_anchors(
    mut commands: Commands,
    config: Res<ScenarioConfig>,
    telemetry: Res<SharedTelemetry>,
    origin: Option<Res<OriginState>>,
    terrain: Option<Res<SharedTerrain>>,
) {
    for spec in &config.anchors {
        let entity = commands
            .spawn((Name::new(spec.name.clone()), GlobeAnchor::default()))
            .id();

        let mut builder = AnchorController::builder(spec.settings.clone())
            .handle(AnchorHandle::from_entity(entity))
            .store(telemetry.0.clone());
        if let Some(origin) = &origin {
            builder = builder.origin(Arc::new(origin.0.signal()));
        }
        if let Some(terrain) = &terrain {
            builder = builder.terrain(terrain.0.clone());
        }

        match builder.build() {
            Ok(controller) => {
                info!("Spawned anchor '{}' ({:?})", spec.name, entity);
                commands.entity(entity).insert(AnchorDriver(controller));
            }
            Err(e) => {
                error!("Anchor '{}' not spawned: {}", spec.name, e);
                commands.entity(entity).despawn();
            }
        }
    }
}

fn drive_anchors(mut anchors: Query<(&mut AnchorDriver, &mut GlobeAnchor)>) {
    let now = Instant::now();
    for (mut driver, mut anchor) in &mut anchors {
        driver.0.tick(now, &mut *anchor);
    }
}
