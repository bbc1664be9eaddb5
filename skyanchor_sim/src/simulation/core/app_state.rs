// skyanchor_sim/src/simulation/core/app_state.rs

use bevy::ecs::schedule::SystemSet;

/// System sets to control the order of execution during `Startup`.
/// Shared resources must exist before anything that consumes them is spawned.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SetupSet {
    /// Pass 1: Create shared resources (telemetry listener, origin initializer, terrain).
    Resources,
    /// Pass 2: Spawn anchored entities that hold handles to those resources.
    Spawn,
}

// =========================================================================
// == Per-Frame Sets (The "Data Flow Graph") ==
// =========================================================================

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnchorSet {
    /// Watch the listener. The store itself is filled off-thread.
    Ingest,
    /// Place the georeference origin once a valid fix exists.
    Origin,
    /// Drive every anchor's sequencer / smoother and write its pose.
    Anchor,
    /// Logging, reporting and run-length control. Runs last.
    Report,
}
