// skyanchor_core/src/anchor/collaborators.rs

//! Interfaces of the external subsystems the anchor logic depends on.
//! The georeferencing, terrain and rendering engines live behind these.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use nalgebra::UnitQuaternion;

use crate::types::GeoPosition;

/// Reports whether the georeferencing origin has been placed.
pub trait OriginReadiness: Send + Sync {
    fn is_initialized(&self) -> bool;
}

/// Accepts the georeferencing origin.
pub trait OriginSink {
    fn place_origin(&mut self, position: GeoPosition);
}

/// A terrain dataset that streams in over time and can be asked for ground heights.
pub trait TerrainDataset: Send + Sync {
    /// Load progress in percent, `[0, 100]`.
    fn load_progress(&self) -> f32;

    /// Starts an asynchronous height query at the most detailed level available.
    /// The returned handle is polled; the call itself must not block.
    fn sample_height_most_detailed(&self, positions: &[GeoPosition]) -> HeightQuery;
}

/// The rendered object's placement. Written once per tick after initialization.
pub trait AnchorSink {
    fn set_position(&mut self, position: GeoPosition);
    /// Orientation in the anchor's east-up-north frame.
    fn set_orientation(&mut self, orientation: UnitQuaternion<f64>);
}

// =========================================================================
// == Asynchronous Height Query ==
// =========================================================================

/// Result for one queried position. On success `position.height` is the terrain height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    pub success: bool,
    pub position: GeoPosition,
}

impl HeightSample {
    pub fn sampled(position: GeoPosition) -> Self {
        Self {
            success: true,
            position,
        }
    }

    pub fn failed(position: GeoPosition) -> Self {
        Self {
            success: false,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryPoll {
    Pending,
    Complete(Vec<HeightSample>),
    /// The producer went away without answering (or the answer was already taken).
    Abandoned,
}

/// Consumer end of a height query. Dropping it cancels interest in the answer.
#[derive(Debug)]
pub struct HeightQuery {
    rx: Receiver<Vec<HeightSample>>,
}

/// Producer end of a height query, handed to whatever computes the heights.
#[derive(Debug)]
pub struct HeightResponder {
    tx: Sender<Vec<HeightSample>>,
}

/// Creates a connected responder/query pair.
pub fn height_query() -> (HeightResponder, HeightQuery) {
    let (tx, rx) = bounded(1);
    (HeightResponder { tx }, HeightQuery { rx })
}

impl HeightQuery {
    /// A query that is already answered.
    pub fn ready(samples: Vec<HeightSample>) -> Self {
        let (responder, query) = height_query();
        responder.complete(samples);
        query
    }

    /// Non-blocking check for the answer.
    pub fn poll(&self) -> QueryPoll {
        match self.rx.try_recv() {
            Ok(samples) => QueryPoll::Complete(samples),
            Err(TryRecvError::Empty) => QueryPoll::Pending,
            Err(TryRecvError::Disconnected) => QueryPoll::Abandoned,
        }
    }
}

impl HeightResponder {
    /// Delivers the answer. A query that has been dropped simply never sees it.
    pub fn complete(self, samples: Vec<HeightSample>) {
        let _ = self.tx.send(samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_lifecycle() {
        let (responder, query) = height_query();
        assert_eq!(query.poll(), QueryPoll::Pending);

        let at = GeoPosition::new(8.0, 47.0, 412.0);
        responder.complete(vec![HeightSample::sampled(at)]);
        assert_eq!(query.poll(), QueryPoll::Complete(vec![HeightSample::sampled(at)]));
        // The answer is handed out once.
        assert_eq!(query.poll(), QueryPoll::Abandoned);
    }

    #[test]
    fn dropped_responder_abandons_the_query() {
        let (responder, query) = height_query();
        drop(responder);
        assert_eq!(query.poll(), QueryPoll::Abandoned);
    }
}
