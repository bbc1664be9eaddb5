// skyanchor_core/src/prelude.rs

// --- Core Abstractions (the collaborator contracts) ---
pub use crate::anchor::{AnchorSink, OriginReadiness, OriginSink, TerrainDataset};
pub use crate::anchor::{HeightQuery, HeightResponder, HeightSample, QueryPoll};
pub use crate::types::{AnchorHandle, AnchorPose, GeoPosition};

// --- Ingest ---
pub use crate::protocol::{decode, frames, DecodeError, Frame, TelemetryMessage};
pub use crate::telemetry::{
    FieldGroup, ListenerError, ListenerStatus, TelemetryListener, TelemetrySample, TelemetryStore,
};

// --- Anchoring ---
pub use crate::anchor::{
    AnchorController, InitializationState, OriginInitializer, OriginSignal, PoseSmoother, PoseState,
};
pub use crate::anchor::{east_up_north_orientation, to_anchor_pose};

// --- Configuration & Errors ---
pub use crate::config::{AnchorConfig, ConfigError, ListenerConfig, OriginConfig, SmoothingConfig};
pub use crate::error::AnchorError;
