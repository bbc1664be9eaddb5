// skyanchor_core/src/anchor/sequencer.rs

//! Start-up gating for one anchored object.
//!
//! ```text
//! WaitingForOrigin ─► WaitingForExternalOriginReady ─► WaitingForTerrainReady
//!                                                            │
//!                          Ready ◄─ SamplingTerrainHeight ◄──┘
//! ```
//!
//! One transition at most per tick. The height query is issued on entry to
//! `SamplingTerrainHeight` and polled on later ticks; nothing here blocks.

use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::collaborators::{HeightQuery, OriginReadiness, QueryPoll, TerrainDataset};
use crate::config::AnchorConfig;
use crate::telemetry::TelemetrySample;
use crate::types::GeoPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum InitializationState {
    #[default]
    WaitingForOrigin,
    WaitingForExternalOriginReady,
    WaitingForTerrainReady,
    SamplingTerrainHeight,
    Ready,
}

/// A condition the sequencer waits on. Not an error: unmet gates are retried every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// A position report has arrived (and, if required, is non-zero).
    PositionFix,
    OriginPlaced,
    TerrainLoaded,
    HeightSampled,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Gate::PositionFix => "valid position fix",
            Gate::OriginPlaced => "georeference origin",
            Gate::TerrainLoaded => "terrain dataset load",
            Gate::HeightSampled => "terrain height query",
        };
        f.write_str(text)
    }
}

impl InitializationState {
    /// The gate that has to open to leave this state.
    pub fn waiting_on(&self) -> Option<Gate> {
        match self {
            Self::WaitingForOrigin => Some(Gate::PositionFix),
            Self::WaitingForExternalOriginReady => Some(Gate::OriginPlaced),
            Self::WaitingForTerrainReady => Some(Gate::TerrainLoaded),
            Self::SamplingTerrainHeight => Some(Gate::HeightSampled),
            Self::Ready => None,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::WaitingForOrigin => Self::WaitingForExternalOriginReady,
            Self::WaitingForExternalOriginReady => Self::WaitingForTerrainReady,
            Self::WaitingForTerrainReady => Self::SamplingTerrainHeight,
            Self::SamplingTerrainHeight | Self::Ready => Self::Ready,
        }
    }
}

/// How the terrain height was resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightOutcome {
    Sampled(f64),
    /// The dataset reported failure, returned nothing usable, or dropped the query.
    Failed,
    TimedOut,
}

impl HeightOutcome {
    /// Height used for placement. Anything but a successful sample counts as 0.
    pub fn height(&self) -> f64 {
        match self {
            Self::Sampled(h) => *h,
            Self::Failed | Self::TimedOut => 0.0,
        }
    }
}

/// Everything resolved during initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialFix {
    pub latitude: f64,
    pub longitude: f64,
    pub height: HeightOutcome,
}

struct PendingHeight {
    query: HeightQuery,
    issued_at: Instant,
}

pub struct InitializationSequencer {
    config: AnchorConfig,
    state: InitializationState,
    /// Gates in the order they were seen open.
    observed: Vec<Gate>,
    initial_position: Option<(f64, f64)>,
    height: Option<HeightOutcome>,
    pending: Option<PendingHeight>,
}

impl InitializationSequencer {
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            config,
            state: InitializationState::default(),
            observed: Vec::with_capacity(4),
            initial_position: None,
            height: None,
            pending: None,
        }
    }

    pub fn state(&self) -> InitializationState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == InitializationState::Ready
    }

    pub fn waiting_on(&self) -> Option<Gate> {
        self.state.waiting_on()
    }

    pub fn observed_gates(&self) -> &[Gate] {
        &self.observed
    }

    /// `(latitude, longitude)` captured when the position gate opened.
    pub fn initial_position(&self) -> Option<(f64, f64)> {
        self.initial_position
    }

    pub fn height_outcome(&self) -> Option<HeightOutcome> {
        self.height
    }

    /// The complete result, once `Ready`.
    pub fn initial_fix(&self) -> Option<InitialFix> {
        match (self.state, self.initial_position, self.height) {
            (InitializationState::Ready, Some((latitude, longitude)), Some(height)) => {
                Some(InitialFix {
                    latitude,
                    longitude,
                    height,
                })
            }
            _ => None,
        }
    }

    /// Evaluates the current gate once and advances if it is open.
    pub fn tick(
        &mut self,
        now: Instant,
        sample: &TelemetrySample,
        origin: &dyn OriginReadiness,
        terrain: &dyn TerrainDataset,
    ) -> InitializationState {
        let opened = match self.state {
            InitializationState::WaitingForOrigin => self.check_position(sample),
            InitializationState::WaitingForExternalOriginReady => origin.is_initialized(),
            InitializationState::WaitingForTerrainReady => {
                terrain.load_progress() >= self.config.terrain_ready_threshold
            }
            InitializationState::SamplingTerrainHeight => self.poll_height(now),
            InitializationState::Ready => false,
        };

        if opened {
            self.advance(now, terrain);
        }
        self.state
    }

    fn check_position(&mut self, sample: &TelemetrySample) -> bool {
        if !sample.has_position() {
            return false;
        }
        let (latitude, longitude) = (sample.latitude(), sample.longitude());
        if self.config.require_nonzero_origin && (latitude == 0.0 || longitude == 0.0) {
            debug!(latitude, longitude, "Position report is zero, still waiting");
            return false;
        }
        self.initial_position = Some((latitude, longitude));
        true
    }

    fn poll_height(&mut self, now: Instant) -> bool {
        let Some(pending) = &self.pending else {
            // Nothing in flight; cannot happen once entry issued a query.
            self.height = Some(HeightOutcome::Failed);
            return true;
        };

        let outcome = match pending.query.poll() {
            QueryPoll::Pending => {
                let expired = self
                    .config
                    .height_query_timeout
                    .is_some_and(|timeout| now.saturating_duration_since(pending.issued_at) >= timeout);
                if !expired {
                    return false;
                }
                HeightOutcome::TimedOut
            }
            QueryPoll::Complete(samples) => samples
                .iter()
                .rev()
                .find(|s| s.success && s.position.height.is_finite())
                .map_or(HeightOutcome::Failed, |s| {
                    HeightOutcome::Sampled(s.position.height)
                }),
            QueryPoll::Abandoned => HeightOutcome::Failed,
        };

        match outcome {
            HeightOutcome::Sampled(height) => info!(height, "Terrain height sampled"),
            HeightOutcome::Failed => warn!("Terrain height query failed, using height 0"),
            HeightOutcome::TimedOut => warn!(
                timeout_s = self.config.height_query_timeout.map(|t| t.as_secs_f64()),
                "Terrain height query timed out, using height 0"
            ),
        }
        self.pending = None;
        self.height = Some(outcome);
        true
    }

    fn advance(&mut self, now: Instant, terrain: &dyn TerrainDataset) {
        if let Some(gate) = self.state.waiting_on() {
            self.observed.push(gate);
        }
        let from = self.state;
        self.state = from.next();
        info!(?from, to = ?self.state, "Anchor initialization advanced");

        if self.state == InitializationState::SamplingTerrainHeight {
            self.issue_height_query(now, terrain);
        }
    }

    fn issue_height_query(&mut self, now: Instant, terrain: &dyn TerrainDataset) {
        let (latitude, longitude) = self.initial_position.unwrap_or_default();
        let probe = GeoPosition::new(longitude, latitude, self.config.terrain_probe_height);
        debug!(?probe, "Issuing terrain height query");
        self.pending = Some(PendingHeight {
            query: terrain.sample_height_most_detailed(&[probe]),
            issued_at: now,
        });
    }
}
