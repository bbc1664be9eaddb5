// skyanchor_sim/src/lib.rs

use bevy::prelude::*;

// Import the plugins defined within the simulation crate.
use crate::simulation::core::simulation_setup::SimulationSetupPlugin;
use crate::simulation::plugins::anchor::AnchorPlugin;
use crate::simulation::plugins::debugging::DebugPlugin;
use crate::simulation::plugins::emitter::EmitterPlugin;
use crate::simulation::plugins::origin::OriginPlugin;
use crate::simulation::plugins::telemetry::TelemetryPlugin;

// This prelude is for convenience for other files WITHIN the skyanchor_sim crate.
pub mod prelude;

// This module contains all the host-specific logic.
pub mod cli;
pub mod simulation;

/// The main plugin that brings together all the host parts.
/// Requires a `ScenarioConfig` resource to be inserted first.
pub struct SkyAnchorPlugin;

impl Plugin for SkyAnchorPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            // System set ordering and run-length control.
            SimulationSetupPlugin,
            // UDP listener and the shared snapshot store.
            TelemetryPlugin,
            // Georeference origin placement.
            OriginPlugin,
            // Terrain dataset, anchored entities and their controllers.
            AnchorPlugin,
            // Optional synthetic telemetry aimed at our own listener.
            EmitterPlugin,
            // Periodic status report.
            DebugPlugin,
        ));
    }
}
