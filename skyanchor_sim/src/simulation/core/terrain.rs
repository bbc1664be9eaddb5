// skyanchor_sim/src/simulation/core/terrain.rs

//! An in-process stand-in for a streamed terrain dataset.

use std::thread;
use std::time::{Duration, Instant};

use skyanchor_core::anchor::{height_query, HeightQuery, HeightSample, TerrainDataset};
use skyanchor_core::types::GeoPosition;

use crate::simulation::config::TerrainConfig;

/// Flat ground at a fixed elevation. Load progress ramps linearly over
/// `load_time`, and height queries are answered from a worker thread after
/// `query_latency`.
#[derive(Debug, Clone)]
pub struct FlatTerrain {
    elevation: f64,
    load_time: Duration,
    query_latency: Duration,
    created_at: Instant,
}

impl FlatTerrain {
    pub fn new(config: &TerrainConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    pub fn starting_at(config: &TerrainConfig, created_at: Instant) -> Self {
        Self {
            elevation: config.elevation,
            load_time: config.load_time,
            query_latency: config.query_latency,
            created_at,
        }
    }

    /// Progress in percent at `now`.
    pub fn progress_at(&self, now: Instant) -> f32 {
        if self.load_time.is_zero() {
            return 100.0;
        }
        let elapsed = now.saturating_duration_since(self.created_at);
        let fraction = elapsed.as_secs_f64() / self.load_time.as_secs_f64();
        (fraction * 100.0).min(100.0) as f32
    }
}

impl TerrainDataset for FlatTerrain {
    fn load_progress(&self) -> f32 {
        self.progress_at(Instant::now())
    }

    fn sample_height_most_detailed(&self, positions: &[GeoPosition]) -> HeightQuery {
        let samples: Vec<HeightSample> = positions
            .iter()
            .map(|p| {
                HeightSample::sampled(GeoPosition {
                    height: self.elevation,
                    ..*p
                })
            })
            .collect();

        if self.query_latency.is_zero() {
            return HeightQuery::ready(samples);
        }

        let (responder, query) = height_query();
        let latency = self.query_latency;
        let spawned = thread::Builder::new()
            .name("terrain-height-query".to_string())
            .spawn(move || {
                thread::sleep(latency);
                responder.complete(samples);
            });
        if let Err(e) = spawned {
            // The responder went down with the closure, so the query reads as abandoned.
            tracing::error!(error = %e, "Failed to spawn terrain query worker");
        }
        query
    }
}
