// skyanchor_core/src/anchor/transform.rs

use nalgebra::{UnitQuaternion, Vector3};

use crate::types::{AnchorPose, GeoPosition};

// The anchor's local east-up-north frame:
//   +X = east (the body's "right" axis)
//   +Y = up
//   +Z = north (the body's "forward" axis)

/// Converts body-frame roll/pitch/yaw (radians) into an east-up-north orientation.
///
/// Roll turns about the forward axis as reported. Pitch (about right) and yaw
/// (about up) are negated. The rotations compose as `yaw * pitch * roll`.
pub fn east_up_north_orientation(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f64> {
    let roll_rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), roll as f64);
    let pitch_rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -(pitch as f64));
    let yaw_rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -(yaw as f64));

    yaw_rotation * pitch_rotation * roll_rotation
}

/// Full geodetic + attitude conversion into the anchor's representation.
/// Position is `(lon, lat, alt)`, the order the anchor expects.
pub fn to_anchor_pose(
    latitude: f64,
    longitude: f64,
    altitude: f64,
    roll: f32,
    pitch: f32,
    yaw: f32,
) -> AnchorPose {
    AnchorPose {
        position: GeoPosition::new(longitude, latitude, altitude),
        orientation: east_up_north_orientation(roll, pitch, yaw),
    }
}
