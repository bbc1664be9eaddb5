// skyanchor_core/src/telemetry/store.rs

//! Latest-value cache shared between the listener thread (sole writer) and the
//! consumer tick (reader).

use parking_lot::RwLock;
use std::time::Instant;

use super::sample::{FieldGroup, Stamped, TelemetrySample};
use crate::protocol::TelemetryMessage;

/// Thread-safe holder of the current [`TelemetrySample`].
///
/// Writes replace one field group under a short write lock; reads clone the
/// whole sample under a read lock. Neither side ever sees a half-written group.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    sample: RwLock<TelemetrySample>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a decoded message into the current sample, stamped with `Instant::now()`.
    ///
    /// Returns the sequence id assigned to the write, or `None` for messages the
    /// store does not keep.
    pub fn publish(&self, message: &TelemetryMessage) -> Option<u64> {
        self.publish_at(message, Instant::now())
    }

    /// Same as [`publish`](Self::publish) with an explicit receive time.
    pub fn publish_at(&self, message: &TelemetryMessage, received_at: Instant) -> Option<u64> {
        let mut sample = self.sample.write();
        let sequence_id = sample.sequence_id + 1;
        match message {
            TelemetryMessage::GlobalPosition(p) => {
                sample.position = Some(Stamped {
                    value: *p,
                    received_at,
                    sequence_id,
                });
            }
            TelemetryMessage::Attitude(a) => {
                sample.attitude = Some(Stamped {
                    value: *a,
                    received_at,
                    sequence_id,
                });
            }
            TelemetryMessage::StatusText(s) => {
                sample.status = Some(Stamped {
                    value: s.clone(),
                    received_at,
                    sequence_id,
                });
            }
            TelemetryMessage::Ignored { .. } => return None,
        }
        sample.sequence_id = sequence_id;
        Some(sequence_id)
    }

    /// A consistent copy of the current sample.
    pub fn read(&self) -> TelemetrySample {
        self.sample.read().clone()
    }

    pub fn last_updated(&self, group: FieldGroup) -> Option<Instant> {
        self.sample.read().last_updated(group)
    }

    /// Sequence id of the latest write. Cheap way to detect "anything new?".
    pub fn sequence_id(&self) -> u64 {
        self.sample.read().sequence_id
    }

    /// Back to "no data yet".
    pub fn reset(&self) {
        *self.sample.write() = TelemetrySample::default();
    }
}
