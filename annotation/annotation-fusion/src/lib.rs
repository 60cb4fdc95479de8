//! Ego-pose fusion for annotation auditing.
//!
//! This crate turns a sparse inertial navigation log into ego poses at the
//! instants annotations were captured, and lifts ego-frame annotations into
//! the world frame:
//!
//! # Pose Log
//!
//! - [`PoseLog`] - Sorted, de-duplicated log of [`EgoPose`](annotation_types::EgoPose) entries
//!
//! # Pose Resolution
//!
//! - [`PoseResolver`] - Exact, nearest-within-tolerance or interpolated pose lookup
//! - [`ResolverConfig`] / [`ResolveMode`] - Strategy and tolerance (100 ms default)
//!
//! # Coordinate Transforms
//!
//! - [`CoordinateTransformer`] - `world = R(q_ego) · local + t_ego`
//! - [`YawSource`] - Quaternion- or azimuth-derived ego heading
//!
//! All operations are synchronous and allocation-free after the log is
//! built, so a single log can be shared read-only across worker threads.
//!
//! # Example
//!
//! ```
//! use annotation_fusion::{CoordinateTransformer, PoseLog, PoseResolver, ResolverConfig};
//! use annotation_types::{EgoPose, Timestamp};
//!
//! let log = PoseLog::new(vec![
//!     EgoPose::from_translation(Timestamp::from_millis(0), [100.0, 0.0, 0.0]),
//!     EgoPose::from_translation(Timestamp::from_millis(100), [101.0, 0.0, 0.0]),
//! ])
//! .unwrap();
//!
//! let resolver = PoseResolver::new(&log, ResolverConfig::default());
//! let pose = resolver.resolve(Timestamp::from_millis(50)).unwrap();
//! let world = CoordinateTransformer::ego_to_world(&pose, [5.0, 0.0, 0.0]);
//! assert!((world.x - 105.5).abs() < 1e-9);
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

mod error;
mod pose_log;
mod resolver;
mod transform;

pub use pose_log::{Bracket, PoseLog};

pub use resolver::{DEFAULT_TOLERANCE, PoseResolver, ResolveMode, ResolverConfig, interpolate_pose};

pub use transform::{CoordinateTransformer, YawSource};

pub use error::{FusionError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CoordinateTransformer, FusionError, PoseLog, PoseResolver, ResolveMode, ResolverConfig,
        YawSource,
    };
}
