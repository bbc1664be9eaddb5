// skyanchor_sim/src/simulation/plugins/debugging/mod.rs

use bevy::prelude::*;

// --- Sub-modules for organization ---
mod systems;

use crate::prelude::{AnchorSet, ScenarioConfig};

/// Periodic status report: listener health, origin, and every anchor's progress.
pub struct DebugPlugin;

/// Fires once per `simulation.report_interval`.
#[derive(Resource)]
pub struct ReportTimer(pub Timer);

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, systems::setup_report_timer)
            .add_systems(
                Update,
                (systems::log_anchor_transitions, systems::report_status)
                    .in_set(AnchorSet::Report)
                    .run_if(resource_exists::<ScenarioConfig>),
            );
    }
}
