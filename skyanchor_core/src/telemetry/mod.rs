// skyanchor_core/src/telemetry/mod.rs

//! Ingest side: the UDP listener thread and the snapshot store it writes.

mod listener;
mod sample;
mod store;

pub use listener::{ListenerError, ListenerStats, ListenerStatus, TelemetryListener};
pub use sample::{FieldGroup, Stamped, TelemetrySample};
pub use store::TelemetryStore;
