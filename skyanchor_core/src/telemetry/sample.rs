// skyanchor_core/src/telemetry/sample.rs

use std::time::Instant;

use crate::protocol::{Attitude, GlobalPosition, StatusText};

/// The three independently arriving parts of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Position,
    Attitude,
    Status,
}

/// A value together with when, and as which publish, it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<T> {
    pub value: T,
    pub received_at: Instant,
    pub sequence_id: u64,
}

/// A point-in-time copy of the latest telemetry.
///
/// Each field group is `None` until its first report arrives, so a real
/// reading of (0, 0) is never confused with "no data yet".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySample {
    pub position: Option<Stamped<GlobalPosition>>,
    pub attitude: Option<Stamped<Attitude>>,
    pub status: Option<Stamped<StatusText>>,
    /// Sequence id of the most recent publish that touched any group. 0 when empty.
    pub sequence_id: u64,
}

impl TelemetrySample {
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.attitude.is_none() && self.status.is_none()
    }

    /// When the given group was last written, or `None` if it never was.
    pub fn last_updated(&self, group: FieldGroup) -> Option<Instant> {
        match group {
            FieldGroup::Position => self.position.as_ref().map(|s| s.received_at),
            FieldGroup::Attitude => self.attitude.as_ref().map(|s| s.received_at),
            FieldGroup::Status => self.status.as_ref().map(|s| s.received_at),
        }
    }

    /// Time of the latest receive event across all groups.
    pub fn received_at(&self) -> Option<Instant> {
        [
            FieldGroup::Position,
            FieldGroup::Attitude,
            FieldGroup::Status,
        ]
        .into_iter()
        .filter_map(|g| self.last_updated(g))
        .max()
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    // --- Flat accessors. Missing groups read as zero / empty. ---

    pub fn latitude(&self) -> f64 {
        self.position.as_ref().map_or(0.0, |p| p.value.latitude)
    }

    pub fn longitude(&self) -> f64 {
        self.position.as_ref().map_or(0.0, |p| p.value.longitude)
    }

    pub fn relative_altitude(&self) -> f64 {
        self.position
            .as_ref()
            .map_or(0.0, |p| p.value.relative_altitude)
    }

    pub fn roll(&self) -> f32 {
        self.attitude.as_ref().map_or(0.0, |a| a.value.roll)
    }

    pub fn pitch(&self) -> f32 {
        self.attitude.as_ref().map_or(0.0, |a| a.value.pitch)
    }

    pub fn yaw(&self) -> f32 {
        self.attitude.as_ref().map_or(0.0, |a| a.value.yaw)
    }

    pub fn status_text(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.value.text.as_str())
    }
}
