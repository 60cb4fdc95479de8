//! Data types for auditing 3D object annotations on `LiDAR` sequences.
//!
//! This crate provides the plain data that flows through the audit engine:
//! - Annotated objects as supplied by a dataset loader
//! - Ego-vehicle poses from the inertial navigation log
//! - Nanosecond-precision time
//! - Quaternion helpers shared by the transform and the validators
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero math-library dependencies**. Positions
//! are `[f64; 3]` and orientations are `[w, x, y, z]` arrays so that loaders
//! can fill them without pulling in a linear algebra stack.
//!
//! # Coordinate Frames
//!
//! - Object positions and orientations are expressed in the **ego frame**
//!   (attached to the sensor-carrying vehicle) at the object's frame.
//! - Ego poses are expressed in the **world frame** (a fixed ground frame,
//!   typically UTM).
//!
//! # Example
//!
//! ```
//! use annotation_types::{AnnotatedObject, BoxSize, EgoPose, FrameId, Timestamp};
//!
//! let car = AnnotatedObject::new("obj-1", "vehicle.car", [12.0, -1.5, 0.8])
//!     .with_instance("track-7")
//!     .with_size(BoxSize::new(4.5, 1.8, 1.5))
//!     .with_rotation([1.0, 0.0, 0.0, 0.0])
//!     .with_points(120);
//!
//! let pose = EgoPose::new(
//!     Timestamp::from_millis(100),
//!     [500_000.0, 4_000_000.0, 10.0],
//!     [1.0, 0.0, 0.0, 0.0],
//! );
//!
//! assert_eq!(car.instance_token.as_deref(), Some("track-7"));
//! assert!(pose.yaw().abs() < 1e-12);
//! assert_eq!(FrameId::new("42").as_integer(), Some(42));
//! ```
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod object;
mod pose;
mod rotation;
mod time;

pub use object::{AnnotatedObject, BoxSize, FrameId};
pub use pose::EgoPose;
pub use rotation::{
    IDENTITY_QUATERNION, euler_angles, normalize_angle, quaternion_from_yaw, quaternion_norm,
    yaw_from_quaternion,
};
pub use time::{Duration, TimeRange, Timestamp};
