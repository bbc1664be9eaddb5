// skyanchor_sim/src/prelude.rs

// Re-export the entire Bevy prelude for convenience.
pub use bevy::prelude::*;

// Re-export the entire skyanchor_core prelude so you can easily access
// pure types like `GeoPosition`, `AnchorController`, `TelemetryStore`, etc.
pub use skyanchor_core::prelude::*;

// Re-export common simulation-specific types for easy access in other plugins.
pub use crate::simulation::config::{AnchorSpec, ScenarioConfig, SimulationSection, TerrainConfig};
pub use crate::simulation::core::app_state::{AnchorSet, SetupSet};
pub use crate::simulation::emitter::{EmitterConfig, FlightPattern};

// Re-export the host-side sinks and the plugins.
pub use crate::simulation::plugins::anchor::{AnchorPlugin, GlobeAnchor};
pub use crate::simulation::plugins::debugging::DebugPlugin;
pub use crate::simulation::plugins::emitter::EmitterPlugin;
pub use crate::simulation::plugins::origin::{GeoreferenceOrigin, OriginPlugin};
pub use crate::simulation::plugins::telemetry::{SharedTelemetry, TelemetryLink, TelemetryPlugin};
