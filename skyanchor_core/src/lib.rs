// skyanchor_core/src/lib.rs

// This file defines the public modules of the library.
pub mod anchor;
pub mod config;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod serde_helpers;
pub mod telemetry;
pub mod types;
