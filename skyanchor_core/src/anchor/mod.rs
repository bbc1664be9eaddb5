// skyanchor_core/src/anchor/mod.rs

//! Consumer side: turns the latest telemetry into a smoothed, georeferenced pose.

pub mod collaborators;
pub mod controller;
pub mod origin;
pub mod sequencer;
pub mod smoother;
pub mod transform;

pub use collaborators::{
    height_query, AnchorSink, HeightQuery, HeightResponder, HeightSample, OriginReadiness,
    OriginSink, QueryPoll, TerrainDataset,
};
pub use controller::{AnchorController, AnchorControllerBuilder};
pub use origin::{OriginInitializer, OriginSignal};
pub use sequencer::{Gate, HeightOutcome, InitialFix, InitializationSequencer, InitializationState};
pub use smoother::{PoseSmoother, PoseState};
pub use transform::{east_up_north_orientation, to_anchor_pose};
