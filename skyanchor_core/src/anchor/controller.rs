// skyanchor_core/src/anchor/controller.rs

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::collaborators::{AnchorSink, OriginReadiness, TerrainDataset};
use super::sequencer::{InitializationSequencer, InitializationState};
use super::smoother::{PoseSmoother, PoseState};
use super::transform::to_anchor_pose;
use crate::config::AnchorConfig;
use crate::error::AnchorError;
use crate::telemetry::{TelemetrySample, TelemetryStore};
use crate::types::{AnchorHandle, AnchorPose};

/// Drives one anchored object: initialization first, then smoothed pose updates.
pub struct AnchorController {
    handle: AnchorHandle,
    config: AnchorConfig,
    store: Arc<TelemetryStore>,
    origin: Arc<dyn OriginReadiness>,
    terrain: Arc<dyn TerrainDataset>,
    sequencer: InitializationSequencer,
    smoother: Option<PoseSmoother>,
}

impl AnchorController {
    pub fn builder(config: AnchorConfig) -> AnchorControllerBuilder {
        AnchorControllerBuilder::new(config)
    }

    pub fn handle(&self) -> AnchorHandle {
        self.handle
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn state(&self) -> InitializationState {
        self.sequencer.state()
    }

    pub fn sequencer(&self) -> &InitializationSequencer {
        &self.sequencer
    }

    /// `None` until the first pose has been published.
    pub fn pose_state(&self) -> Option<&PoseState> {
        self.smoother.as_ref().map(|s| s.state())
    }

    /// One consumer tick. Returns the pose written to `sink`, if any.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn AnchorSink) -> Option<AnchorPose> {
        let sample = self.store.read();

        let pose = if let Some(smoother) = &mut self.smoother {
            smoother.tick(&sample)
        } else {
            self.initialize(now, &sample)?
        };

        sink.set_position(pose.position);
        sink.set_orientation(pose.orientation);
        Some(pose)
    }

    /// Runs the sequencer; on reaching `Ready` builds the first pose and the smoother.
    fn initialize(&mut self, now: Instant, sample: &TelemetrySample) -> Option<AnchorPose> {
        let state = self
            .sequencer
            .tick(now, sample, self.origin.as_ref(), self.terrain.as_ref());
        if state != InitializationState::Ready {
            return None;
        }
        let fix = self.sequencer.initial_fix()?;

        let height_bias = fix.height.height() + self.config.vertical_offset;
        let initial = to_anchor_pose(
            fix.latitude,
            fix.longitude,
            sample.relative_altitude() + height_bias,
            sample.roll(),
            sample.pitch(),
            sample.yaw(),
        );
        info!(
            anchor = self.handle.0,
            latitude = fix.latitude,
            longitude = fix.longitude,
            height = initial.position.height,
            "Anchor ready, publishing first pose"
        );
        self.smoother = Some(PoseSmoother::new(
            initial,
            self.config.smoothing,
            height_bias,
        ));
        Some(initial)
    }
}

/// Collects the collaborators an [`AnchorController`] needs.
pub struct AnchorControllerBuilder {
    config: AnchorConfig,
    handle: AnchorHandle,
    store: Option<Arc<TelemetryStore>>,
    origin: Option<Arc<dyn OriginReadiness>>,
    terrain: Option<Arc<dyn TerrainDataset>>,
}

impl AnchorControllerBuilder {
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            config,
            handle: AnchorHandle::default(),
            store: None,
            origin: None,
            terrain: None,
        }
    }

    pub fn handle(mut self, handle: AnchorHandle) -> Self {
        self.handle = handle;
        self
    }

    pub fn store(mut self, store: Arc<TelemetryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn origin(mut self, origin: Arc<dyn OriginReadiness>) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn terrain(mut self, terrain: Arc<dyn TerrainDataset>) -> Self {
        self.terrain = Some(terrain);
        self
    }

    pub fn build(self) -> Result<AnchorController, AnchorError> {
        self.config.validate()?;
        let store = self
            .store
            .ok_or(AnchorError::MissingCollaborator("telemetry store"))?;
        let origin = self
            .origin
            .ok_or(AnchorError::MissingCollaborator("origin readiness"))?;
        let terrain = self
            .terrain
            .ok_or(AnchorError::MissingCollaborator("terrain dataset"))?;

        Ok(AnchorController {
            handle: self.handle,
            sequencer: InitializationSequencer::new(self.config.clone()),
            config: self.config,
            store,
            origin,
            terrain,
            smoother: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::collaborators::{HeightQuery, HeightSample};
    use crate::anchor::origin::OriginSignal;
    use crate::config::SmoothingConfig;
    use crate::protocol::{Attitude, GlobalPosition, TelemetryMessage};
    use crate::types::GeoPosition;
    use approx::assert_abs_diff_eq;
    use nalgebra::UnitQuaternion;

    /// Fully loaded terrain at a fixed elevation that answers immediately.
    struct FixedTerrain(f64);

    impl TerrainDataset for FixedTerrain {
        fn load_progress(&self) -> f32 {
            100.0
        }

        fn sample_height_most_detailed(&self, positions: &[GeoPosition]) -> HeightQuery {
            HeightQuery::ready(
                positions
                    .iter()
                    .map(|p| HeightSample::sampled(GeoPosition { height: self.0, ..*p }))
                    .collect(),
            )
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        positions: Vec<GeoPosition>,
        orientations: Vec<UnitQuaternion<f64>>,
    }

    impl AnchorSink for RecordingSink {
        fn set_position(&mut self, position: GeoPosition) {
            self.positions.push(position);
        }

        fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
            self.orientations.push(orientation);
        }
    }

    fn publish_fix(store: &TelemetryStore, latitude: f64, longitude: f64, altitude: f64) {
        store.publish(&TelemetryMessage::GlobalPosition(GlobalPosition {
            latitude,
            longitude,
            relative_altitude: altitude,
            ..Default::default()
        }));
    }

    #[test]
    fn builder_rejects_missing_collaborators() {
        let err = AnchorController::builder(AnchorConfig::default())
            .origin(Arc::new(OriginSignal::new()))
            .terrain(Arc::new(FixedTerrain(0.0)))
            .build()
            .err();
        assert_eq!(err, Some(AnchorError::MissingCollaborator("telemetry store")));

        let err = AnchorController::builder(AnchorConfig::default())
            .store(Arc::new(TelemetryStore::new()))
            .terrain(Arc::new(FixedTerrain(0.0)))
            .build()
            .err();
        assert_eq!(err, Some(AnchorError::MissingCollaborator("origin readiness")));

        let err = AnchorController::builder(AnchorConfig::default())
            .store(Arc::new(TelemetryStore::new()))
            .origin(Arc::new(OriginSignal::new()))
            .build()
            .err();
        assert_eq!(err, Some(AnchorError::MissingCollaborator("terrain dataset")));
    }

    #[test]
    fn builder_validates_config() {
        let config = AnchorConfig {
            smoothing: SmoothingConfig {
                position_factor: 0.0,
                rotation_factor: 0.1,
            },
            ..Default::default()
        };
        let result = AnchorController::builder(config)
            .store(Arc::new(TelemetryStore::new()))
            .origin(Arc::new(OriginSignal::new()))
            .terrain(Arc::new(FixedTerrain(0.0)))
            .build();
        assert!(matches!(result, Err(AnchorError::Config(_))));
    }

    #[test]
    fn publishes_nothing_before_ready_then_smooths() {
        let store = Arc::new(TelemetryStore::new());
        let origin = OriginSignal::new();
        let config = AnchorConfig {
            vertical_offset: 2.0,
            smoothing: SmoothingConfig {
                position_factor: 0.5,
                rotation_factor: 0.5,
            },
            ..Default::default()
        };
        let mut controller = AnchorController::builder(config)
            .handle(AnchorHandle(7))
            .store(store.clone())
            .origin(Arc::new(origin.clone()))
            .terrain(Arc::new(FixedTerrain(400.0)))
            .build()
            .unwrap();
        let mut sink = RecordingSink::default();
        let now = Instant::now();

        // No telemetry, no origin: nothing is written.
        assert_eq!(controller.tick(now, &mut sink), None);
        publish_fix(&store, 47.0, 8.0, 100.0);
        assert_eq!(controller.tick(now, &mut sink), None);
        assert_eq!(controller.state(), InitializationState::WaitingForExternalOriginReady);

        origin.raise();
        // Origin gate, then terrain gate (which issues the query).
        for _ in 0..2 {
            assert_eq!(controller.tick(now, &mut sink), None);
        }
        assert!(sink.positions.is_empty());

        let first = controller.tick(now, &mut sink).unwrap();
        assert_eq!(controller.state(), InitializationState::Ready);
        assert_eq!(first.position, GeoPosition::new(8.0, 47.0, 502.0));
        assert_eq!(sink.positions, vec![first.position]);

        // Aircraft climbs 20 m; the smoother moves halfway each tick.
        publish_fix(&store, 47.0, 8.0, 120.0);
        store.publish(&TelemetryMessage::Attitude(Attitude {
            yaw: 1.0,
            ..Default::default()
        }));
        let second = controller.tick(now, &mut sink).unwrap();
        assert_abs_diff_eq!(second.position.height, 512.0, epsilon = 1e-9);
        assert_abs_diff_eq!(second.orientation.angle(), 0.5, epsilon = 1e-6);

        let third = controller.tick(now, &mut sink).unwrap();
        assert_abs_diff_eq!(third.position.height, 517.0, epsilon = 1e-9);
        assert_eq!(sink.positions.len(), 3);
        assert_eq!(sink.orientations.len(), 3);
        assert_eq!(controller.pose_state().unwrap().target.position.height, 522.0);
    }

    #[test]
    fn store_reset_after_ready_holds_the_pose() {
        let store = Arc::new(TelemetryStore::new());
        let origin = OriginSignal::new();
        origin.raise();
        let config = AnchorConfig {
            smoothing: SmoothingConfig {
                position_factor: 0.5,
                rotation_factor: 0.5,
            },
            ..Default::default()
        };
        let mut controller = AnchorController::builder(config)
            .store(store.clone())
            .origin(Arc::new(origin))
            .terrain(Arc::new(FixedTerrain(400.0)))
            .build()
            .unwrap();
        let mut sink = RecordingSink::default();
        let now = Instant::now();

        publish_fix(&store, 47.0, 8.0, 100.0);
        store.publish(&TelemetryMessage::Attitude(Attitude {
            yaw: 1.0,
            ..Default::default()
        }));
        let mut ticks = 0;
        while controller.tick(now, &mut sink).is_none() {
            ticks += 1;
            assert!(ticks < 10, "controller never became ready");
        }
        let placed = *sink.positions.last().unwrap();
        assert_eq!(placed, GeoPosition::new(8.0, 47.0, 500.0));

        store.reset();
        for _ in 0..30 {
            controller.tick(now, &mut sink);
        }
        let held = *sink.positions.last().unwrap();
        assert_abs_diff_eq!(held.latitude, 47.0, epsilon = 1e-9);
        assert_abs_diff_eq!(held.longitude, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(held.height, 500.0, epsilon = 1e-9);
        let orientation = sink.orientations.last().unwrap();
        assert_abs_diff_eq!(orientation.angle(), 1.0, epsilon = 1e-6);
    }
}
