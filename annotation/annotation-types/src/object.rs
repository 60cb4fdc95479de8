//! Annotated 3D objects and frame identifiers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rotation::{euler_angles, quaternion_norm};
use crate::time::Timestamp;

/// Identifier of one annotated frame within a sequence.
///
/// Loaders emit frame identifiers as strings; most datasets use integer
/// indices but some use timestamps or opaque names. Ordering is decided by
/// the collection that holds the identifiers, not by this type, because a
/// sequence is only numerically ordered when *all* of its identifiers are
/// integer-like.
///
/// # Example
///
/// ```
/// use annotation_types::FrameId;
///
/// assert_eq!(FrameId::new(" 17 ").as_integer(), Some(17));
/// assert_eq!(FrameId::new("17a").as_integer(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FrameId(String);

impl FrameId {
    /// Creates a frame identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the identifier as a signed integer, ignoring surrounding whitespace.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FrameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for FrameId {
    fn from(index: u64) -> Self {
        Self(index.to_string())
    }
}

/// Bounding box extent in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxSize {
    /// Extent along the object's heading axis.
    pub length: f64,
    /// Extent across the heading axis.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl BoxSize {
    /// Creates a box size from length, width and height.
    #[must_use]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Returns `[length, width, height]`.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.length, self.width, self.height]
    }
}

impl From<[f64; 3]> for BoxSize {
    fn from([length, width, height]: [f64; 3]) -> Self {
        Self::new(length, width, height)
    }
}

/// One annotated 3D box in one frame.
///
/// Position and orientation are in the ego frame of the frame the object
/// belongs to. The loader normalizes quaternions to `[w, x, y, z]` order
/// before objects reach the audit engine.
///
/// `size` and `rotation` are optional: an absent field makes the checks that
/// depend on it not applicable rather than failing.
///
/// # Example
///
/// ```
/// use annotation_types::{AnnotatedObject, BoxSize};
///
/// let cone = AnnotatedObject::new("c-3", "traffic_cone", [5.0, 2.0, 0.3])
///     .with_size(BoxSize::new(0.4, 0.4, 0.7))
///     .with_points(12);
///
/// assert!(cone.instance_token.is_none());
/// assert!(cone.rotation.is_none());
/// assert_eq!(cone.num_points, 12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnnotatedObject {
    /// Unique token of this annotation.
    pub token: String,
    /// Track identity shared by the same physical object across frames.
    #[cfg_attr(feature = "serde", serde(default))]
    pub instance_token: Option<String>,
    /// Free-form class label (e.g. `vehicle.car`, `pedestrian`).
    pub class_name: String,
    /// Box center in the ego frame, meters.
    pub translation: [f64; 3],
    /// Box orientation in the ego frame, `[w, x, y, z]`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rotation: Option<[f64; 4]>,
    /// Box extent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub size: Option<BoxSize>,
    /// Number of `LiDAR` returns inside the box.
    #[cfg_attr(feature = "serde", serde(default))]
    pub num_points: u32,
    /// Capture time, when the loader knows it per object.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: Option<Timestamp>,
}

impl AnnotatedObject {
    /// Creates an object with the required fields; everything else is empty.
    #[must_use]
    pub fn new(token: impl Into<String>, class_name: impl Into<String>, translation: [f64; 3]) -> Self {
        Self {
            token: token.into(),
            instance_token: None,
            class_name: class_name.into(),
            translation,
            rotation: None,
            size: None,
            num_points: 0,
            timestamp: None,
        }
    }

    /// Sets the track identity.
    #[must_use]
    pub fn with_instance(mut self, instance_token: impl Into<String>) -> Self {
        self.instance_token = Some(instance_token.into());
        self
    }

    /// Sets the box orientation (`[w, x, y, z]`).
    #[must_use]
    pub const fn with_rotation(mut self, rotation: [f64; 4]) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Sets the box extent.
    #[must_use]
    pub const fn with_size(mut self, size: BoxSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the `LiDAR` point count.
    #[must_use]
    pub const fn with_points(mut self, num_points: u32) -> Self {
        self.num_points = num_points;
        self
    }

    /// Sets the capture time.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Returns the norm of the orientation quaternion, if present.
    #[must_use]
    pub fn rotation_norm(&self) -> Option<f64> {
        self.rotation.map(quaternion_norm)
    }

    /// Returns the heading in the ego frame, if an orientation is present.
    #[must_use]
    pub fn yaw(&self) -> Option<f64> {
        self.rotation.map(|q| euler_angles(q).2)
    }

    /// Returns `true` when the lowercase class label contains `keyword`.
    ///
    /// `keyword` is expected in lowercase.
    #[must_use]
    pub fn class_contains(&self, keyword: &str) -> bool {
        self.class_name.to_lowercase().contains(keyword)
    }
}
