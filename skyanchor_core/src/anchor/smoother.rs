// skyanchor_core/src/anchor/smoother.rs

use crate::anchor::transform::east_up_north_orientation;
use crate::config::SmoothingConfig;
use crate::telemetry::TelemetrySample;
use crate::types::{AnchorPose, GeoPosition};

/// Below this angle two orientations are treated as identical and no slerp is attempted.
const SLERP_EPSILON: f64 = 1.0e-9;

/// What is shown now, and what the latest telemetry says it should approach.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseState {
    pub current: AnchorPose,
    pub target: AnchorPose,
}

/// Exponential blend of the displayed pose toward the telemetry pose.
///
/// Each tick moves position by `position_factor` and orientation by
/// `rotation_factor` of the remaining distance. Factors are per tick, not per
/// second, so convergence speed follows the tick rate.
///
/// Longitude is blended linearly, so a target across the ±180° meridian is
/// approached the long way round.
#[derive(Debug, Clone)]
pub struct PoseSmoother {
    state: PoseState,
    smoothing: SmoothingConfig,
    /// Added to the telemetry relative altitude: sampled terrain height plus the configured offset.
    height_bias: f64,
}

impl PoseSmoother {
    /// Starts at rest on `initial`.
    pub fn new(initial: AnchorPose, smoothing: SmoothingConfig, height_bias: f64) -> Self {
        Self {
            state: PoseState {
                current: initial,
                target: initial,
            },
            smoothing,
            height_bias,
        }
    }

    pub fn state(&self) -> &PoseState {
        &self.state
    }

    pub fn height_bias(&self) -> f64 {
        self.height_bias
    }

    /// Updates the target from `sample` and blends one step toward it.
    ///
    /// A field group the sample does not carry (e.g. after the store was reset)
    /// leaves that part of the target where it was.
    pub fn tick(&mut self, sample: &TelemetrySample) -> AnchorPose {
        let mut target = self.state.target;
        if let Some(position) = &sample.position {
            let report = &position.value;
            target.position = GeoPosition::new(
                report.longitude,
                report.latitude,
                report.relative_altitude + self.height_bias,
            );
        }
        if let Some(attitude) = &sample.attitude {
            let attitude = &attitude.value;
            target.orientation =
                east_up_north_orientation(attitude.roll, attitude.pitch, attitude.yaw);
        }
        self.step_toward(target)
    }

    /// Blends one step toward an explicit target.
    pub fn step_toward(&mut self, target: AnchorPose) -> AnchorPose {
        let current = self.state.current;

        let position = current
            .position
            .to_vector()
            .lerp(&target.position.to_vector(), self.smoothing.position_factor);

        // `try_slerp` refuses (near-)identical or antipodal inputs.
        let orientation = current
            .orientation
            .try_slerp(
                &target.orientation,
                self.smoothing.rotation_factor,
                SLERP_EPSILON,
            )
            .unwrap_or(target.orientation);

        self.state = PoseState {
            current: AnchorPose {
                position: GeoPosition::from_vector(&position),
                orientation,
            },
            target,
        };
        self.state.current
    }
}
