// skyanchor_sim/src/simulation/emitter.rs

//! Synthetic MAVLink telemetry: an aircraft orbiting a fixed point.
//!
//! Used by the `telemetry_emitter` example and, when enabled in the scenario,
//! by the in-app [`EmitterPlugin`](crate::simulation::plugins::emitter::EmitterPlugin)
//! so a single process can exercise the whole pipeline.

use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use skyanchor_core::protocol::{
    encode_v2, Attitude, GlobalPositionInt, OutgoingMessage, Severity, StatusText,
};
use skyanchor_core::serde_helpers;

/// WGS84 equatorial radius, metres.
const EARTH_RADIUS_M: f64 = 6_378_137.0;
const GRAVITY: f64 = 9.80665;
/// MAV_COMP_ID_AUTOPILOT1
const COMPONENT_ID: u8 = 1;

#[derive(Error, Debug)]
pub enum EmitterError {
    #[error("failed to open emitter socket: {0}")]
    Socket(#[from] io::Error),

    #[error("invalid GPS noise: {0}")]
    Noise(#[from] NormalError),
}

// =========================================================================
// == Configuration ==
// =========================================================================

/// A constant-speed circle around a centre point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlightPattern {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_m: f64,
    /// Height above home, metres.
    pub altitude_m: f64,
    /// Time for one full orbit.
    #[serde(with = "serde_helpers::duration_secs")]
    pub period: Duration,
}

impl Default for FlightPattern {
    fn default() -> Self {
        Self {
            center_latitude: 47.3977,
            center_longitude: 8.5456,
            radius_m: 150.0,
            altitude_m: 60.0,
            period: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterConfig {
    /// Run the in-app emitter alongside the listener.
    pub enabled: bool,
    /// Destination. Defaults to the listener's own port on loopback.
    pub target: Option<SocketAddr>,
    /// Position and attitude reports per second.
    pub rate_hz: f64,
    #[serde(with = "serde_helpers::duration_secs")]
    pub status_interval: Duration,
    /// Standard deviation of horizontal GPS noise, metres. 0 disables it.
    pub gps_noise_m: f64,
    pub seed: Option<u64>,
    pub system_id: u8,
    pub flight: FlightPattern,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: None,
            rate_hz: 10.0,
            status_interval: Duration::from_secs(5),
            gps_noise_m: 0.0,
            seed: None,
            system_id: 1,
            flight: FlightPattern::default(),
        }
    }
}

// =========================================================================
// == Flight Model ==
// =========================================================================

/// Where the aircraft is and how it is oriented at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Radians, NED body convention.
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl FlightPattern {
    fn angular_rate(&self) -> f64 {
        TAU / self.period.as_secs_f64().max(f64::EPSILON)
    }

    /// State `t` seconds into the flight. The orbit is flown clockwise seen from above.
    pub fn state_at(&self, t: f64) -> FlightState {
        let omega = self.angular_rate();
        let theta = omega * t;
        let north = self.radius_m * theta.cos();
        let east = self.radius_m * theta.sin();
        let (latitude, longitude) = self.offset(north, east);

        // Heading is tangent to the circle; bank balances the centripetal load.
        let yaw = wrap_pi(theta + PI / 2.0);
        let roll = (omega * omega * self.radius_m / GRAVITY).atan();

        FlightState {
            latitude,
            longitude,
            altitude: self.altitude_m,
            roll,
            pitch: 0.0,
            yaw,
        }
    }

    /// Centre shifted by a north/east offset in metres.
    fn offset(&self, north: f64, east: f64) -> (f64, f64) {
        let lat_rad = self.center_latitude.to_radians();
        let latitude = self.center_latitude + (north / EARTH_RADIUS_M).to_degrees();
        let longitude =
            self.center_longitude + (east / (EARTH_RADIUS_M * lat_rad.cos())).to_degrees();
        (latitude, longitude)
    }
}

fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

// =========================================================================
// == Emitter ==
// =========================================================================

/// Builds and sends the datagrams for the configured flight.
pub struct TelemetryEmitter {
    config: EmitterConfig,
    socket: UdpSocket,
    target: SocketAddr,
    noise: Option<Normal<f64>>,
    sequence: u8,
    next_status_at: f64,
    datagrams_sent: u64,
}

impl TelemetryEmitter {
    /// Opens an ephemeral UDP socket for sending to `target`.
    pub fn new(config: EmitterConfig, target: SocketAddr) -> Result<Self, EmitterError> {
        let noise = if config.gps_noise_m > 0.0 {
            Some(Normal::new(0.0, config.gps_noise_m)?)
        } else {
            None
        };
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        info!(%target, rate_hz = config.rate_hz, "Telemetry emitter ready");
        Ok(Self {
            config,
            socket,
            target,
            noise,
            sequence: 0,
            next_status_at: 0.0,
            datagrams_sent: 0,
        })
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent
    }

    /// Interval between reports.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.rate_hz.max(f64::EPSILON))
    }

    /// The datagrams due `t` seconds into the flight: position, attitude, and a
    /// status text when one is due.
    pub fn datagrams_at<R: Rng + ?Sized>(&mut self, t: f64, rng: &mut R) -> Vec<Vec<u8>> {
        let state = self.config.flight.state_at(t);
        let (latitude, longitude) = match &self.noise {
            Some(noise) => {
                let north = noise.sample(&mut *rng);
                let east = noise.sample(&mut *rng);
                let lat_rad = state.latitude.to_radians();
                (
                    state.latitude + (north / EARTH_RADIUS_M).to_degrees(),
                    state.longitude + (east / (EARTH_RADIUS_M * lat_rad.cos())).to_degrees(),
                )
            }
            None => (state.latitude, state.longitude),
        };
        let time_boot_ms = (t * 1000.0) as u32;

        let mut messages = vec![
            OutgoingMessage::GlobalPosition(GlobalPositionInt::from_degrees(
                time_boot_ms,
                latitude,
                longitude,
                state.altitude,
            )),
            OutgoingMessage::Attitude(Attitude {
                time_boot_ms,
                roll: state.roll as f32,
                pitch: state.pitch as f32,
                yaw: state.yaw as f32,
                ..Default::default()
            }),
        ];

        if t >= self.next_status_at {
            let text = if self.next_status_at == 0.0 {
                StatusText::new(Severity::Notice, "Emitter online")
            } else {
                let laps = t / self.config.flight.period.as_secs_f64().max(f64::EPSILON);
                StatusText::new(Severity::Info, format!("Orbit progress {laps:.2} laps"))
            };
            messages.push(OutgoingMessage::StatusText(text));
            self.next_status_at += self.config.status_interval.as_secs_f64().max(f64::EPSILON);
        }

        messages
            .iter()
            .map(|msg| {
                let frame = encode_v2(self.sequence, self.config.system_id, COMPONENT_ID, msg);
                self.sequence = self.sequence.wrapping_add(1);
                frame
            })
            .collect()
    }

    /// Sends everything due at `t`. Returns the number of datagrams sent.
    pub fn emit_at<R: Rng + ?Sized>(&mut self, t: f64, rng: &mut R) -> io::Result<usize> {
        let datagrams = self.datagrams_at(t, rng);
        for datagram in &datagrams {
            self.socket.send_to(datagram, self.target)?;
        }
        self.datagrams_sent += datagrams.len() as u64;
        debug!(t, count = datagrams.len(), "Emitted telemetry");
        Ok(datagrams.len())
    }
}
