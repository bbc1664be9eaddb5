// skyanchor_sim/src/simulation/core/simulation_setup.rs

use crate::prelude::*;

pub struct SimulationSetupPlugin;

impl Plugin for SimulationSetupPlugin {
    fn build(&self, app: &mut App) {
        // --- CONFIGURE THE STARTUP PIPELINE ---
        // Shared resources first, then the entities that hold handles to them.
        app.configure_sets(Startup, (SetupSet::Resources, SetupSet::Spawn).chain());

        // --- CONFIGURE THE PER-FRAME DATA FLOW ---
        app.configure_sets(
            Update,
            (
                AnchorSet::Ingest,
                AnchorSet::Origin,
                AnchorSet::Anchor,
                AnchorSet::Report,
            )
                .chain(),
        );

        app.add_systems(Update, exit_after_duration.in_set(AnchorSet::Report));
    }
}

/// Ends the run once `simulation.duration_seconds` of app time has elapsed.
fn exit_after_duration(
    time: Res<Time>,
    config: Res<ScenarioConfig>,
    mut exit: EventWriter<AppExit>,
    mut requested: Local<bool>,
) {
    let Some(limit) = config.simulation.duration_seconds else {
        return;
    };
    if !*requested && time.elapsed_secs_f64() >= limit {
        info!("Run duration of {:.1} s reached, exiting", limit);
        exit.write(AppExit::Success);
        *requested = true;
    }
}
