//! Plausibility audit for 3D LiDAR annotations.
//!
//! Given the annotated objects of a driving sequence and a sparse ego-pose
//! log, this crate reports annotations that are geometrically or
//! kinematically implausible:
//!
//! # Configuration
//!
//! - [`RuleConfig`] - Point minimum, ordered size rules, attitude limits,
//!   motion thresholds and pose handling; loaded from YAML or JSON
//!
//! # Inputs
//!
//! - [`SequenceCatalog`] / [`Frame`] - Per-frame object lists in frame order
//! - [`TrackBuilder`] / [`Track`] - Objects grouped by instance token
//!
//! # Checks
//!
//! - [`GeometryValidator`] - Point count, box size, quaternion norm, roll and pitch
//! - [`MotionValidator`] - Heading vs. motion, speed, acceleration, direction
//!   changes, regime stability and turn rate
//!
//! # Results
//!
//! - [`SequenceAuditor`] - Runs every check over a sequence
//! - [`AuditReport`] / [`Issue`] - Ordered findings with summary statistics
//!
//! Annotation problems are always reported as [`Issue`] values. Errors are
//! reserved for unusable configuration.
//!
//! # Example
//!
//! ```
//! use annotation_audit::{Frame, RuleConfig, SequenceAuditor, SequenceCatalog};
//! use annotation_fusion::PoseLog;
//! use annotation_types::{AnnotatedObject, BoxSize};
//!
//! let truck = AnnotatedObject::new("t1", "vehicle.truck", [12.0, -3.0, 0.5])
//!     .with_size(BoxSize::new(30.0, 2.5, 3.5))
//!     .with_rotation([1.0, 0.0, 0.0, 0.0])
//!     .with_points(120);
//!
//! let catalog = SequenceCatalog::new(vec![Frame::new("0", vec![truck])]);
//! let auditor = SequenceAuditor::new(RuleConfig::standard()).unwrap();
//! let report = auditor.audit(&catalog, &PoseLog::default());
//!
//! assert_eq!(report.issues().len(), 1);
//! assert_eq!(report.issues()[0].kind.code(), "size_out_of_range");
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

mod auditor;
mod catalog;
mod config;
mod error;
mod geometry;
mod issue;
mod motion;
mod regime;
mod report;
mod track;

pub use auditor::{AuditOptions, SequenceAuditor};

pub use catalog::{Frame, FrameOrdering, SequenceCatalog};

pub use config::{
    AttitudeLimits, Bounds, ClassMatcher, MotionThresholds, PoseSection, RegimeProfile, RuleConfig,
    SizeRule,
};

pub use geometry::GeometryValidator;

pub use issue::{Issue, IssueKind, IssueSeverity, SizeAxis};

pub use motion::{LOOKBACK, MotionValidator};

pub use regime::MotionRegime;

pub use report::{AuditReport, AuditSummary};

pub use track::{Track, TrackBuilder, TrackSample};

pub use error::{AuditError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        AuditError, AuditReport, Frame, GeometryValidator, Issue, IssueKind, MotionValidator,
        RuleConfig, SequenceAuditor, SequenceCatalog, TrackBuilder,
    };
}
