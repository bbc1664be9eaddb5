// skyanchor_core/src/config.rs

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

use crate::serde_helpers;

// =========================================================================
// == Validation Errors ==
// =========================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("smoothing factor '{name}' must be in (0, 1], got {value}")]
    InvalidSmoothingFactor { name: &'static str, value: f64 },

    #[error("'{name}' must be a positive duration")]
    InvalidTimeout { name: &'static str },

    #[error("terrain readiness threshold must be within [0, 100], got {0}")]
    InvalidReadinessThreshold(f32),

    #[error("'{name}' must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

// =========================================================================
// == Listener ==
// =========================================================================

/// Network settings for the telemetry listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    /// UDP port to bind.
    pub port: u16,
    /// Local address to bind. `0.0.0.0` listens on every interface.
    pub bind_address: IpAddr,
    /// Upper bound on a single blocking receive. `stop()` is observed within
    /// one of these intervals.
    #[serde(with = "serde_helpers::duration_secs")]
    pub receive_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 14555,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            receive_timeout: Duration::from_millis(2000),
        }
    }
}

impl ListenerConfig {
    pub fn endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero read timeout is rejected by the OS socket API.
        if self.receive_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                name: "receive_timeout",
            });
        }
        Ok(())
    }
}

// =========================================================================
// == Anchor (sequencer + smoother) ==
// =========================================================================

/// Per-tick blend factors. Lower values give smoother, slower motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    pub position_factor: f64,
    pub rotation_factor: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            position_factor: 0.1,
            rotation_factor: 0.1,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_factor("position_factor", self.position_factor)?;
        check_factor("rotation_factor", self.rotation_factor)
    }
}

fn check_factor(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSmoothingFactor { name, value })
    }
}

/// Settings for one anchored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnchorConfig {
    pub smoothing: SmoothingConfig,
    /// Metres added on top of altitude + terrain height, e.g. to lift a model's
    /// pivot above its landing gear.
    pub vertical_offset: f64,
    /// Terrain load progress (percent) at which height sampling may begin.
    pub terrain_ready_threshold: f32,
    /// Height of the probe point handed to the terrain height query.
    pub terrain_probe_height: f64,
    /// How long to wait for the terrain height query before falling back to 0.
    /// `None` waits forever.
    #[serde(with = "serde_helpers::option_duration_secs")]
    pub height_query_timeout: Option<Duration>,
    /// Treat a reported latitude or longitude of exactly zero as "not yet valid".
    /// Must agree with [`OriginConfig::require_nonzero_origin`], or an origin placed
    /// at a zero coordinate leaves the anchor waiting for a fix it will never accept.
    pub require_nonzero_origin: bool,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            vertical_offset: 0.0,
            terrain_ready_threshold: 99.0,
            terrain_probe_height: 3500.0,
            height_query_timeout: Some(Duration::from_secs(30)),
            require_nonzero_origin: true,
        }
    }
}

impl AnchorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.smoothing.validate()?;
        check_finite("vertical_offset", self.vertical_offset)?;
        check_finite("terrain_probe_height", self.terrain_probe_height)?;
        if !(0.0..=100.0).contains(&self.terrain_ready_threshold) {
            return Err(ConfigError::InvalidReadinessThreshold(
                self.terrain_ready_threshold,
            ));
        }
        if self.height_query_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidTimeout {
                name: "height_query_timeout",
            });
        }
        Ok(())
    }
}

// =========================================================================
// == Origin ==
// =========================================================================

/// Settings for placing the georeferencing origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OriginConfig {
    /// Grace period after start-up before the first position is considered.
    #[serde(with = "serde_helpers::duration_secs")]
    pub initialization_delay: Duration,
    /// Height, in metres, at which the origin is placed.
    pub origin_height: f64,
    /// Treat a reported latitude or longitude of exactly zero as "not yet valid".
    /// Every anchor's `require_nonzero_origin` has to match this.
    pub require_nonzero_origin: bool,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            initialization_delay: Duration::from_millis(200),
            origin_height: 2250.0,
            require_nonzero_origin: true,
        }
    }
}

impl OriginConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite("origin_height", self.origin_height)
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ListenerConfig::default().validate().is_ok());
        assert!(AnchorConfig::default().validate().is_ok());
        assert!(OriginConfig::default().validate().is_ok());
        assert_eq!(ListenerConfig::default().endpoint().port(), 14555);
    }

    #[test]
    fn smoothing_factor_bounds() {
        let mut smoothing = SmoothingConfig::default();
        smoothing.position_factor = 1.0;
        assert!(smoothing.validate().is_ok());

        smoothing.position_factor = 0.0;
        assert_eq!(
            smoothing.validate(),
            Err(ConfigError::InvalidSmoothingFactor {
                name: "position_factor",
                value: 0.0
            })
        );

        smoothing.position_factor = 0.5;
        smoothing.rotation_factor = 1.5;
        assert!(smoothing.validate().is_err());
    }

    #[test]
    fn zero_receive_timeout_is_rejected() {
        let config = ListenerConfig {
            receive_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_finite_heights_are_rejected() {
        let origin = OriginConfig {
            origin_height: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            origin.validate(),
            Err(ConfigError::NonFinite {
                name: "origin_height",
                ..
            })
        ));

        let anchor = AnchorConfig {
            vertical_offset: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(
            anchor.validate(),
            Err(ConfigError::NonFinite {
                name: "vertical_offset",
                value: f64::INFINITY
            })
        );
    }
}
