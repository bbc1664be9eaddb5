// skyanchor_sim/src/simulation/config/structs.rs

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use skyanchor_core::config::{AnchorConfig, ListenerConfig, OriginConfig};
use skyanchor_core::serde_helpers;

use super::ScenarioError;
use crate::simulation::emitter::EmitterConfig;

// =========================================================================
// == Top-Level Configuration Resource ==
// =========================================================================

/// # ScenarioConfig
/// The Bevy resource holding all configuration for a run.
/// This struct is the root of the data parsed from a scenario `.toml` file.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    pub simulation: SimulationSection,
    pub listener: ListenerConfig,
    pub origin: OriginConfig,
    pub terrain: TerrainConfig,
    pub emitter: EmitterConfig,
    // The TOML has `[[anchors]]`, which becomes a Vec of AnchorSpec structs.
    pub anchors: Vec<AnchorSpec>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationSection::default(),
            listener: ListenerConfig::default(),
            origin: OriginConfig::default(),
            terrain: TerrainConfig::default(),
            emitter: EmitterConfig::default(),
            anchors: vec![AnchorSpec::default()],
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.listener.validate()?;
        self.origin.validate()?;
        for anchor in &self.anchors {
            anchor.settings.validate()?;
            // The origin is placed on the same kind of fix the anchors wait for.
            if anchor.settings.require_nonzero_origin != self.origin.require_nonzero_origin {
                return Err(ScenarioError::InvalidField {
                    name: "anchors.settings.require_nonzero_origin",
                    reason: "must match origin.require_nonzero_origin",
                });
            }
        }
        if !(self.simulation.tick_rate_hz > 0.0 && self.simulation.tick_rate_hz.is_finite()) {
            return Err(ScenarioError::InvalidField {
                name: "simulation.tick_rate_hz",
                reason: "must be a positive number",
            });
        }
        if !(self.emitter.rate_hz > 0.0 && self.emitter.rate_hz.is_finite()) {
            return Err(ScenarioError::InvalidField {
                name: "emitter.rate_hz",
                reason: "must be a positive number",
            });
        }
        if self.simulation.report_interval.is_zero() {
            return Err(ScenarioError::InvalidField {
                name: "simulation.report_interval",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Stop after this many seconds. Runs until interrupted when absent.
    pub duration_seconds: Option<f64>,
    /// Consumer tick frequency in Hz.
    pub tick_rate_hz: f64,
    /// How often the debug report is logged.
    #[serde(with = "serde_helpers::duration_secs")]
    pub report_interval: Duration,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            duration_seconds: None,
            tick_rate_hz: 60.0,
            report_interval: Duration::from_secs(5),
        }
    }
}

/// The in-process flat terrain dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerrainConfig {
    /// Ground height in metres everywhere.
    pub elevation: f64,
    /// Time for load progress to ramp from 0 to 100 %.
    #[serde(with = "serde_helpers::duration_secs")]
    pub load_time: Duration,
    /// Delay before a height query is answered.
    #[serde(with = "serde_helpers::duration_secs")]
    pub query_latency: Duration,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            elevation: 0.0,
            load_time: Duration::from_secs(2),
            query_latency: Duration::from_millis(100),
        }
    }
}

/// One anchored object to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorSpec {
    pub name: String,
    #[serde(default)]
    pub settings: AnchorConfig,
}

impl Default for AnchorSpec {
    fn default() -> Self {
        Self {
            name: "drone".to_string(),
            settings: AnchorConfig::default(),
        }
    }
}
