// skyanchor_sim/src/cli.rs

use bevy::prelude::Resource;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::simulation::config::ScenarioConfig;

/// SkyAnchor: places a live MAVLink-tracked aircraft on a georeferenced globe.
///
/// This struct defines the command-line arguments that can be passed to any
/// binary application that uses the SkyAnchor host library. Flags given here
/// override the scenario file and the environment.
#[derive(Parser, Debug, Resource, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/default.toml")]
    pub config: PathBuf,

    /// UDP port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Local address to bind the listener to.
    #[arg(short, long)]
    pub bind: Option<IpAddr>,

    /// Exit after this many seconds.
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Also run the built-in synthetic telemetry emitter.
    #[arg(long, default_value_t = false)]
    pub emit: bool,

    /// Print the effective scenario as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}

impl Cli {
    /// Applies the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut ScenarioConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(duration) = self.duration {
            config.simulation.duration_seconds = Some(duration);
        }
        if self.emit {
            config.emitter.enabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn flags_override_the_scenario() {
        let cli = Cli::parse_from([
            "live_anchor",
            "--config",
            "custom.toml",
            "--port",
            "14600",
            "--bind",
            "127.0.0.1",
            "--duration",
            "30",
            "--emit",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));

        let mut config = ScenarioConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.listener.port, 14600);
        assert_eq!(config.listener.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.simulation.duration_seconds, Some(30.0));
        assert!(config.emitter.enabled);
    }

    #[test]
    fn absent_flags_leave_the_scenario_alone() {
        let cli = Cli::parse_from(["live_anchor"]);
        let mut config = ScenarioConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, ScenarioConfig::default());
    }
}
