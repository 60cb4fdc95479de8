//! Audit findings.

use std::fmt;

use annotation_types::{AnnotatedObject, FrameId};
use serde::{Deserialize, Serialize};

use crate::regime::MotionRegime;

/// How much attention a finding needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Informational; does not fail a frame.
    Info,
    /// Likely annotation error.
    Warning,
}

impl IssueSeverity {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Box dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeAxis {
    /// Extent along the heading.
    Length,
    /// Lateral extent.
    Width,
    /// Vertical extent.
    Height,
}

impl SizeAxis {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}

/// What was found, with the measured values.
///
/// Angles are stored in radians and displayed in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    /// Too few LiDAR returns inside the box.
    LowPointCount {
        /// Points inside the box.
        count: u32,
        /// Configured minimum.
        min: u32,
    },

    /// A box dimension outside the class range.
    SizeOutOfRange {
        /// Offending dimension.
        axis: SizeAxis,
        /// Measured value in meters.
        value: f64,
        /// Admissible minimum.
        min: f64,
        /// Admissible maximum.
        max: f64,
        /// Name of the size rule applied.
        rule: String,
    },

    /// Orientation quaternion norm deviates from 1.
    QuaternionNotNormalized {
        /// Measured norm.
        norm: f64,
    },

    /// |roll| above the limit.
    ExcessiveRoll {
        /// Roll in radians.
        roll: f64,
    },

    /// |pitch| above the limit.
    ExcessivePitch {
        /// Pitch in radians.
        pitch: f64,
    },

    /// Annotated heading disagrees with the direction of travel.
    HeadingMismatch {
        /// Angle between heading and motion in radians, in `[0, π]`.
        delta: f64,
        /// Estimated speed in m/s.
        speed: f64,
        /// Regime the tolerance was taken from.
        regime: MotionRegime,
    },

    /// Annotated heading is opposite to the direction of travel.
    ReverseMotion {
        /// Angle between heading and motion in radians.
        delta: f64,
        /// Estimated speed in m/s.
        speed: f64,
        /// Regime the tolerance was taken from.
        regime: MotionRegime,
    },

    /// Acceleration between consecutive intervals above the limit.
    ExcessiveAcceleration {
        /// Acceleration magnitude in m/s².
        acceleration: f64,
    },

    /// Regime switches on too many intervals.
    UnstableMotionState {
        /// Intervals whose regime differs from the previous one.
        switches: usize,
        /// Intervals considered.
        intervals: usize,
    },

    /// Speed between consecutive samples above the limit.
    TrajectoryDiscontinuity {
        /// Implied speed in m/s.
        speed: f64,
    },

    /// Large displacement right after a static interval.
    StaticPositionJump {
        /// Planar displacement in meters.
        distance: f64,
    },

    /// Sharp angle between consecutive displacements.
    AbruptDirectionChange {
        /// Turn angle in radians.
        angle: f64,
    },

    /// Annotated heading turns faster than the limit.
    ExcessiveTurnRate {
        /// Turn rate in rad/s.
        rate: f64,
    },
}

impl IssueKind {
    /// Returns a stable snake-case code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::LowPointCount { .. } => "low_point_count",
            Self::SizeOutOfRange { .. } => "size_out_of_range",
            Self::QuaternionNotNormalized { .. } => "quaternion_not_normalized",
            Self::ExcessiveRoll { .. } => "excessive_roll",
            Self::ExcessivePitch { .. } => "excessive_pitch",
            Self::HeadingMismatch { .. } => "heading_mismatch",
            Self::ReverseMotion { .. } => "reverse_motion",
            Self::ExcessiveAcceleration { .. } => "excessive_acceleration",
            Self::UnstableMotionState { .. } => "unstable_motion_state",
            Self::TrajectoryDiscontinuity { .. } => "trajectory_discontinuity",
            Self::StaticPositionJump { .. } => "static_position_jump",
            Self::AbruptDirectionChange { .. } => "abrupt_direction_change",
            Self::ExcessiveTurnRate { .. } => "excessive_turn_rate",
        }
    }

    /// Returns the severity of this kind.
    #[must_use]
    pub const fn severity(&self) -> IssueSeverity {
        match self {
            Self::ReverseMotion { .. } => IssueSeverity::Info,
            _ => IssueSeverity::Warning,
        }
    }

    /// Returns true for findings of the geometry checks.
    #[must_use]
    pub const fn is_geometric(&self) -> bool {
        matches!(
            self,
            Self::LowPointCount { .. }
                | Self::SizeOutOfRange { .. }
                | Self::QuaternionNotNormalized { .. }
                | Self::ExcessiveRoll { .. }
                | Self::ExcessivePitch { .. }
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowPointCount { count, min } => {
                write!(f, "only {count} lidar points (minimum {min})")
            }
            Self::SizeOutOfRange {
                axis,
                value,
                min,
                max,
                rule,
            } => write!(
                f,
                "{} {value:.2} m outside {rule} range [{min:.2}, {max:.2}]",
                axis.as_str()
            ),
            Self::QuaternionNotNormalized { norm } => {
                write!(f, "rotation quaternion norm {norm:.4} is not 1")
            }
            Self::ExcessiveRoll { roll } => write!(f, "roll {:.1}° too large", roll.to_degrees()),
            Self::ExcessivePitch { pitch } => {
                write!(f, "pitch {:.1}° too large", pitch.to_degrees())
            }
            Self::HeadingMismatch {
                delta,
                speed,
                regime,
            } => write!(
                f,
                "heading differs from motion by {:.1}° at {speed:.2} m/s ({regime})",
                delta.to_degrees()
            ),
            Self::ReverseMotion {
                delta,
                speed,
                regime,
            } => write!(
                f,
                "moving backwards: heading {:.1}° from motion at {speed:.2} m/s ({regime})",
                delta.to_degrees()
            ),
            Self::ExcessiveAcceleration { acceleration } => {
                write!(f, "acceleration {acceleration:.2} m/s² too large")
            }
            Self::UnstableMotionState {
                switches,
                intervals,
            } => write!(f, "motion state switches on {switches} of {intervals} intervals"),
            Self::TrajectoryDiscontinuity { speed } => {
                write!(f, "position jumps at {speed:.2} m/s")
            }
            Self::StaticPositionJump { distance } => {
                write!(f, "static object moved {distance:.2} m")
            }
            Self::AbruptDirectionChange { angle } => {
                write!(f, "direction changes by {:.1}°", angle.to_degrees())
            }
            Self::ExcessiveTurnRate { rate } => {
                write!(f, "heading turns at {:.1}°/s", rate.to_degrees())
            }
        }
    }
}

/// One finding attached to one object in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Frame of the object.
    pub frame: FrameId,
    /// Annotation token of the object.
    pub object_token: String,
    /// Class label of the object.
    pub class_name: String,
    /// What was found.
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl Issue {
    /// Attaches a finding to an object.
    #[must_use]
    pub fn new(frame: &FrameId, object: &AnnotatedObject, kind: IssueKind) -> Self {
        Self {
            frame: frame.clone(),
            object_token: object.token.clone(),
            class_name: object.class_name.clone(),
            kind,
        }
    }

    /// Returns the severity of the finding.
    #[must_use]
    pub const fn severity(&self) -> IssueSeverity {
        self.kind.severity()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] frame {} {} ({}): {}",
            self.severity(),
            self.frame,
            self.object_token,
            self.class_name,
            self.kind
        )
    }
}
