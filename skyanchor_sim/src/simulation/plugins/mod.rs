// skyanchor_sim/src/simulation/plugins/mod.rs

pub mod anchor;
pub mod debugging;
pub mod emitter;
pub mod origin;
pub mod telemetry;
