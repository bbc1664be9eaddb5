// skyanchor_core/src/types.rs

use nalgebra::{UnitQuaternion, Vector3};

// --- Core Identifier ---
/// Identifies one managed rendered object. Each handle owns exactly one
/// initialization sequencer and pose smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnchorHandle(pub u64);

impl AnchorHandle {
    // A convenience method for use in the Bevy adapter crate.
    #[cfg(feature = "bevy")] // This will only compile if the "bevy" feature is enabled
    pub fn from_entity(entity: bevy_ecs::prelude::Entity) -> Self {
        Self(entity.to_bits())
    }

    #[cfg(feature = "bevy")]
    pub fn to_entity(self) -> bevy_ecs::prelude::Entity {
        bevy_ecs::prelude::Entity::from_bits(self.0)
    }
}

// --- Geodetic position in the order the anchor expects ---
/// Longitude and latitude in degrees, height in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl GeoPosition {
    pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    /// `(lon, lat, height)` as a vector, for blending.
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.longitude, self.latitude, self.height)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// What gets written to the anchor sink: where the object is, and which way it faces
/// in the anchor's east-up-north frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPose {
    pub position: GeoPosition,
    pub orientation: UnitQuaternion<f64>,
}

impl Default for AnchorPose {
    fn default() -> Self {
        Self {
            position: GeoPosition::default(),
            orientation: UnitQuaternion::identity(),
        }
    }
}
