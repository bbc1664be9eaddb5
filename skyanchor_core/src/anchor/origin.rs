// skyanchor_core/src/anchor/origin.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::collaborators::{OriginReadiness, OriginSink};
use crate::config::OriginConfig;
use crate::telemetry::TelemetrySample;
use crate::types::GeoPosition;

/// Shared "origin has been placed" flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct OriginSignal(Arc<AtomicBool>);

impl OriginSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl OriginReadiness for OriginSignal {
    fn is_initialized(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Places the georeferencing origin at the first valid fix after a start-up delay.
#[derive(Debug)]
pub struct OriginInitializer {
    config: OriginConfig,
    signal: OriginSignal,
    started_at: Option<Instant>,
    placed: Option<GeoPosition>,
    warned: bool,
}

impl OriginInitializer {
    pub fn new(config: OriginConfig) -> Self {
        Self {
            config,
            signal: OriginSignal::new(),
            started_at: None,
            placed: None,
            warned: false,
        }
    }

    /// Readiness handle for the anchor sequencers.
    pub fn signal(&self) -> OriginSignal {
        self.signal.clone()
    }

    pub fn placed(&self) -> Option<GeoPosition> {
        self.placed
    }

    /// Polls once. The first call starts the delay clock.
    ///
    /// Returns the origin on the tick it gets placed.
    pub fn tick(
        &mut self,
        now: Instant,
        sample: &TelemetrySample,
        sink: &mut dyn OriginSink,
    ) -> Option<GeoPosition> {
        if self.placed.is_some() {
            return None;
        }
        let started_at = *self.started_at.get_or_insert(now);
        if now.saturating_duration_since(started_at) < self.config.initialization_delay {
            return None;
        }

        let (latitude, longitude) = (sample.latitude(), sample.longitude());
        let valid = sample.has_position()
            && !(self.config.require_nonzero_origin && (latitude == 0.0 || longitude == 0.0));
        if !valid {
            if !self.warned {
                warn!("Waiting for a valid position fix to place the origin");
                self.warned = true;
            } else {
                debug!(latitude, longitude, "Still no valid position fix");
            }
            return None;
        }

        let origin = GeoPosition::new(longitude, latitude, self.config.origin_height);
        sink.place_origin(origin);
        self.placed = Some(origin);
        self.signal.raise();
        info!(latitude, longitude, height = origin.height, "Georeference origin placed");
        Some(origin)
    }
}
