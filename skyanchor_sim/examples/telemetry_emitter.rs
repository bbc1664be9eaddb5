// skyanchor_sim/examples/telemetry_emitter.rs

//! Standalone synthetic MAVLink source: an aircraft orbiting a fixed point.
//!
//! Start `live_anchor` in one terminal, then in another:
//! `cargo run --example telemetry_emitter -- --target 127.0.0.1:14555 --noise 2.0`

use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use skyanchor_sim::simulation::core::prng::SimulationRng;
use skyanchor_sim::simulation::emitter::{EmitterConfig, TelemetryEmitter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Streams a synthetic MAVLink orbit over UDP")]
struct Args {
    /// Where to send the datagrams.
    #[arg(short, long, default_value = "127.0.0.1:14555")]
    target: SocketAddr,

    /// Reports per second.
    #[arg(short, long, default_value_t = 10.0)]
    rate: f64,

    /// Seed for the GPS noise.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Standard deviation of horizontal GPS noise, metres.
    #[arg(short, long, default_value_t = 0.0)]
    noise: f64,

    /// Stop after this many seconds.
    #[arg(short, long)]
    duration: Option<f64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if !(args.rate > 0.0 && args.rate.is_finite()) {
        error!(rate = args.rate, "Rate must be a positive number");
        return ExitCode::FAILURE;
    }

    let config = EmitterConfig {
        enabled: true,
        target: Some(args.target),
        rate_hz: args.rate,
        gps_noise_m: args.noise,
        seed: args.seed,
        ..Default::default()
    };
    let mut emitter = match TelemetryEmitter::new(config, args.target) {
        Ok(emitter) => emitter,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut rng = SimulationRng::from_seed(args.seed);

    let period = emitter.period();
    let start = Instant::now();
    let mut next = start;
    loop {
        let t = start.elapsed().as_secs_f64();
        if args.duration.is_some_and(|limit| t >= limit) {
            break;
        }
        if let Err(e) = emitter.emit_at(t, &mut rng.0) {
            error!("Send failed: {}", e);
        }
        next += period;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }

    info!(
        datagrams = emitter.datagrams_sent(),
        "Emitter finished after {:.1?}",
        start.elapsed()
    );
    ExitCode::SUCCESS
}
