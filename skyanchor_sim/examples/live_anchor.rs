// skyanchor_sim/examples/live_anchor.rs

//! Runs the full telemetry-to-globe pipeline headless.
//!
//! This example demonstrates how to:
//! 1. Load a scenario from a TOML file, layered with `SKYANCHOR_*` env vars and CLI flags.
//! 2. Set up a headless Bevy app ticking at the scenario's rate.
//! 3. Add the `SkyAnchorPlugin`, which listens for MAVLink telemetry and drives the anchors.
//!
//! Point a flight controller (or the `telemetry_emitter` example) at UDP 14555, or run
//! with `--emit` to feed the app its own synthetic orbit:
//! `cargo run --example live_anchor -- --emit --duration 30`

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

use skyanchor_sim::cli::Cli;
use skyanchor_sim::simulation::config::load_scenario;
use skyanchor_sim::SkyAnchorPlugin;

fn main() -> ExitCode {
    // --- 1. Load Scenario Configuration ---
    let cli = Cli::parse();
    let mut config = match load_scenario(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not load scenario '{}': {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    if cli.print_config {
        return match toml::to_string_pretty(&config) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Could not serialize scenario: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // --- 2. Core Bevy Plugins & Resources ---
    let tick = Duration::from_secs_f64(1.0 / config.simulation.tick_rate_hz);
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick)),
        LogPlugin {
            level: bevy::log::Level::INFO,
            filter: "info,skyanchor_sim=debug,skyanchor_core=debug".to_string(),
            ..default()
        },
    ))
    .insert_resource(config)
    .insert_resource(cli);

    // --- 3. The Pipeline ---
    app.add_plugins(SkyAnchorPlugin);

    // --- 4. Run ---
    match app.run() {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(_) => ExitCode::FAILURE,
    }
}
