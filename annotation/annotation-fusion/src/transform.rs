//! Ego-frame to world-frame transforms.

use annotation_types::{EgoPose, normalize_angle, yaw_from_quaternion};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Where the ego heading comes from when lifting object headings to world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YawSource {
    /// Derive yaw from the pose orientation quaternion.
    #[default]
    Quaternion,

    /// Use the pose azimuth scalar, falling back to the quaternion yaw when
    /// the entry has none.
    Azimuth,
}

/// Maps positions and headings from the ego frame into the world frame.
///
/// The transform is `world = R(q_ego) · local + t_ego`, with `R` built from
/// the `[w, x, y, z]` orientation exactly as supplied. The quaternion is
/// never renormalized here; an off-unit ego orientation produces a scaled
/// result, which is the caller's signal that the pose log is suspect.
///
/// # Example
///
/// ```
/// use annotation_fusion::CoordinateTransformer;
/// use annotation_types::{EgoPose, Timestamp, quaternion_from_yaw};
/// use std::f64::consts::FRAC_PI_2;
///
/// // Ego at (10, 0) facing +Y
/// let pose = EgoPose::new(Timestamp::default(), [10.0, 0.0, 0.0], quaternion_from_yaw(FRAC_PI_2));
/// let world = CoordinateTransformer::ego_to_world(&pose, [2.0, 0.0, 0.0]);
///
/// assert!((world.x - 10.0).abs() < 1e-9);
/// assert!((world.y - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Builds the rotation matrix of a `[w, x, y, z]` quaternion without
    /// normalizing it.
    #[must_use]
    pub fn rotation_matrix(q: [f64; 4]) -> Matrix3<f64> {
        let [w, x, y, z] = q;
        Matrix3::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        )
    }

    /// Transforms an ego-frame position into the world frame.
    #[must_use]
    pub fn ego_to_world(pose: &EgoPose, local: [f64; 3]) -> Vector3<f64> {
        let rotation = Self::rotation_matrix(pose.orientation);
        rotation * Vector3::from(local) + Vector3::from(pose.position)
    }

    /// Returns the ego heading in the world frame.
    #[must_use]
    pub fn ego_yaw(pose: &EgoPose, source: YawSource) -> f64 {
        match (source, pose.azimuth) {
            (YawSource::Azimuth, Some(azimuth)) => azimuth,
            _ => yaw_from_quaternion(pose.orientation),
        }
    }

    /// Lifts an ego-frame heading into the world frame, wrapped to `(-π, π]`.
    #[must_use]
    pub fn heading_to_world(pose: &EgoPose, object_yaw: f64, source: YawSource) -> f64 {
        normalize_angle(Self::ego_yaw(pose, source) + object_yaw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use annotation_types::{Timestamp, quaternion_from_yaw};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn identity_pose_translates_only() {
        let pose = EgoPose::from_translation(Timestamp::default(), [100.0, 200.0, 5.0]);
        let world = CoordinateTransformer::ego_to_world(&pose, [1.0, 2.0, 3.0]);
        assert_relative_eq!(world, Vector3::new(101.0, 202.0, 8.0));
    }

    #[test]
    fn rotation_matrix_of_identity() {
        let r = CoordinateTransformer::rotation_matrix([1.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(r, Matrix3::identity());
    }

    #[test]
    fn quarter_turn_maps_x_to_y() {
        let pose = EgoPose::new(Timestamp::default(), [0.0; 3], quaternion_from_yaw(FRAC_PI_2));
        let world = CoordinateTransformer::ego_to_world(&pose, [1.0, 0.0, 0.0]);
        assert_relative_eq!(world, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn does_not_renormalize_input() {
        // A pure scalar quaternion of norm 2 is not a rotation; the formula
        // leaves it as identity, so the input must pass through unchanged.
        let pose = EgoPose::new(Timestamp::default(), [0.0; 3], [2.0, 0.0, 0.0, 0.0]);
        let world = CoordinateTransformer::ego_to_world(&pose, [1.0, 1.0, 0.0]);
        assert_relative_eq!(world, Vector3::new(1.0, 1.0, 0.0));

        // A scaled yaw quaternion is not renormalized either
        let scaled = quaternion_from_yaw(FRAC_PI_2).map(|c| c * 1.1);
        let r = CoordinateTransformer::rotation_matrix(scaled);
        let unit = CoordinateTransformer::rotation_matrix(quaternion_from_yaw(FRAC_PI_2));
        assert!((r - unit).norm() > 1e-3);
    }

    #[test]
    fn ego_yaw_sources() {
        let pose = EgoPose::new(Timestamp::default(), [0.0; 3], quaternion_from_yaw(0.5));
        assert_relative_eq!(
            CoordinateTransformer::ego_yaw(&pose, YawSource::Quaternion),
            0.5,
            epsilon = 1e-12
        );
        // No azimuth on the entry: falls back to the quaternion
        assert_relative_eq!(
            CoordinateTransformer::ego_yaw(&pose, YawSource::Azimuth),
            0.5,
            epsilon = 1e-12
        );
        let with_azimuth = pose.with_azimuth(1.0);
        assert_eq!(CoordinateTransformer::ego_yaw(&with_azimuth, YawSource::Azimuth), 1.0);
    }

    #[test]
    fn heading_to_world_wraps() {
        let pose = EgoPose::new(Timestamp::default(), [0.0; 3], quaternion_from_yaw(3.0));
        let heading = CoordinateTransformer::heading_to_world(&pose, 1.0, YawSource::Quaternion);
        assert_relative_eq!(heading, 4.0 - 2.0 * PI, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn unit_rotation_preserves_length(
            yaw in -PI..PI,
            local in prop::array::uniform3(-50.0..50.0f64),
        ) {
            let pose = EgoPose::new(Timestamp::default(), [0.0; 3], quaternion_from_yaw(yaw));
            let world = CoordinateTransformer::ego_to_world(&pose, local);
            let expected = Vector3::from(local).norm();
            prop_assert!((world.norm() - expected).abs() < 1e-9);
        }
    }
}
