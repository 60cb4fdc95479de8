//! Quaternion helpers for `[w, x, y, z]` orientations.
//!
//! Annotation tools do not always emit unit quaternions, so none of these
//! helpers normalize their input. Callers that need a norm check use
//! [`quaternion_norm`] explicitly.

use std::f64::consts::{PI, TAU};

/// The identity rotation `[w, x, y, z] = [1, 0, 0, 0]`.
pub const IDENTITY_QUATERNION: [f64; 4] = [1.0, 0.0, 0.0, 0.0];

/// Returns the Euclidean norm of a `[w, x, y, z]` quaternion.
///
/// # Example
///
/// ```
/// use annotation_types::quaternion_norm;
///
/// assert!((quaternion_norm([0.5, 0.5, 0.5, 0.5]) - 1.0).abs() < 1e-12);
/// assert!((quaternion_norm([2.0, 0.0, 0.0, 0.0]) - 2.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn quaternion_norm(q: [f64; 4]) -> f64 {
    let [w, x, y, z] = q;
    w.mul_add(w, x.mul_add(x, y.mul_add(y, z * z))).sqrt()
}

/// Decomposes a `[w, x, y, z]` quaternion into `(roll, pitch, yaw)` radians.
///
/// Uses the aerospace (intrinsic Z-Y-X) convention. The `asin` argument for
/// pitch is clamped to `[-1, 1]` so that floating-point overshoot near
/// gimbal lock yields `±π/2` instead of `NaN`.
///
/// # Example
///
/// ```
/// use annotation_types::{euler_angles, quaternion_from_yaw};
///
/// let (roll, pitch, yaw) = euler_angles(quaternion_from_yaw(0.7));
/// assert!(roll.abs() < 1e-12);
/// assert!(pitch.abs() < 1e-12);
/// assert!((yaw - 0.7).abs() < 1e-12);
/// ```
#[must_use]
pub fn euler_angles(q: [f64; 4]) -> (f64, f64, f64) {
    let [w, x, y, z] = q;

    let sinr_cosp = 2.0 * w.mul_add(x, y * z);
    let cosr_cosp = 2.0_f64.mul_add(-x.mul_add(x, y * y), 1.0);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let sinp = 2.0 * w.mul_add(y, -(z * x));
    let pitch = sinp.clamp(-1.0, 1.0).asin();

    (roll, pitch, yaw_from_quaternion(q))
}

/// Extracts the heading (rotation about +Z) of a `[w, x, y, z]` quaternion.
#[must_use]
pub fn yaw_from_quaternion(q: [f64; 4]) -> f64 {
    let [w, x, y, z] = q;
    let siny_cosp = 2.0 * w.mul_add(z, x * y);
    let cosy_cosp = 2.0_f64.mul_add(-y.mul_add(y, z * z), 1.0);
    siny_cosp.atan2(cosy_cosp)
}

/// Builds the unit quaternion for a pure rotation of `yaw` radians about +Z.
#[must_use]
pub fn quaternion_from_yaw(yaw: f64) -> [f64; 4] {
    let half = yaw * 0.5;
    [half.cos(), 0.0, 0.0, half.sin()]
}

/// Wraps an angle into `(-π, π]`.
///
/// # Example
///
/// ```
/// use annotation_types::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert!((normalize_angle(2.5 * PI) - PI / 2.0).abs() < 1e-12);
/// assert!((normalize_angle(-PI / 2.0 - 2.0 * PI) + PI / 2.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}
