// skyanchor_sim/src/simulation/config/mod.rs

//! This module handles loading and validating the scenario configuration:
//! a TOML file, layered with `SKYANCHOR_`-prefixed environment variables.

mod structs;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use thiserror::Error;

use skyanchor_core::config::ConfigError;

pub use structs::{AnchorSpec, ScenarioConfig, SimulationSection, TerrainConfig};

/// Prefix for environment overrides, e.g. `SKYANCHOR_LISTENER__PORT=14556`.
pub const ENV_PREFIX: &str = "SKYANCHOR_";

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to load scenario: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid scenario: {0}")]
    Invalid(#[from] ConfigError),

    #[error("invalid scenario: '{name}' {reason}")]
    InvalidField {
        name: &'static str,
        reason: &'static str,
    },
}

/// Base figment for a scenario file. A missing file falls back to defaults.
pub fn scenario_figment(path: impl AsRef<Path>) -> Figment {
    Figment::new()
        .merge(Toml::file(path.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Extracts and validates a scenario from any figment.
pub fn extract_scenario(figment: &Figment) -> Result<ScenarioConfig, ScenarioError> {
    let config: ScenarioConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

/// Loads the scenario at `path`, applying environment overrides.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<ScenarioConfig, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(?path, "Scenario file not found, using defaults");
    }
    extract_scenario(&scenario_figment(path))
}
