//! Ego-vehicle poses from the inertial navigation log.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rotation::{IDENTITY_QUATERNION, quaternion_norm, yaw_from_quaternion};
use crate::time::Timestamp;

/// World-frame pose of the ego vehicle at one instant.
///
/// # Quaternion Convention
///
/// `orientation` is stored as `[w, x, y, z]` where `w` is the scalar part.
/// Navigation logs that store `x, y, z, w` must be reordered by the loader.
///
/// # Azimuth
///
/// Some logs carry a separate heading scalar. When present it is kept
/// verbatim (radians, counter-clockwise from world +X) so that callers can
/// choose between it and the quaternion-derived yaw.
///
/// # Example
///
/// ```
/// use annotation_types::{EgoPose, Timestamp};
///
/// let pose = EgoPose::new(Timestamp::from_millis(0), [1.0, 2.0, 0.0], [1.0, 0.0, 0.0, 0.0])
///     .with_azimuth(0.25);
///
/// assert_eq!(pose.azimuth, Some(0.25));
/// assert!(pose.is_normalized(1e-9));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EgoPose {
    /// Capture time of this pose.
    pub timestamp: Timestamp,
    /// Ego position in the world frame, meters.
    pub position: [f64; 3],
    /// Ego orientation in the world frame, `[w, x, y, z]`.
    pub orientation: [f64; 4],
    /// Optional heading scalar supplied by the navigation system.
    #[cfg_attr(feature = "serde", serde(default))]
    pub azimuth: Option<f64>,
}

impl EgoPose {
    /// Creates a pose without an azimuth.
    #[must_use]
    pub const fn new(timestamp: Timestamp, position: [f64; 3], orientation: [f64; 4]) -> Self {
        Self {
            timestamp,
            position,
            orientation,
            azimuth: None,
        }
    }

    /// Creates a pose at `position` with no rotation.
    #[must_use]
    pub const fn from_translation(timestamp: Timestamp, position: [f64; 3]) -> Self {
        Self::new(timestamp, position, IDENTITY_QUATERNION)
    }

    /// Sets the azimuth scalar.
    #[must_use]
    pub const fn with_azimuth(mut self, azimuth: f64) -> Self {
        self.azimuth = Some(azimuth);
        self
    }

    /// Returns the heading derived from the orientation quaternion.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        yaw_from_quaternion(self.orientation)
    }

    /// Returns the orientation quaternion norm.
    #[must_use]
    pub fn quaternion_norm(&self) -> f64 {
        quaternion_norm(self.orientation)
    }

    /// Checks if the orientation is a unit quaternion within `tolerance`.
    #[must_use]
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.quaternion_norm() - 1.0).abs() < tolerance
    }

    /// Returns `true` if every numeric component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.orientation.iter().all(|v| v.is_finite())
            && self.azimuth.is_none_or(f64::is_finite)
    }
}
