//! Track-level motion checks.
//!
//! Two families of checks run on every qualifying track:
//!
//! - **Alignment**: per sample, the annotated heading is compared with the
//!   direction of travel estimated from up to two neighbors on each side.
//! - **Kinematics**: per track, consecutive displacements are checked for
//!   implausible speed, acceleration, direction changes and turn rates.
//!
//! Positions are lifted to the world frame when poses are available. A
//! missing pose degrades the affected computation to the ego frame; it never
//! produces a finding by itself.

use std::f64::consts::PI;

use annotation_fusion::CoordinateTransformer;
use annotation_types::{AnnotatedObject, EgoPose, normalize_angle, quaternion_norm};
use nalgebra::{Vector2, Vector3};
use tracing::debug;

use crate::config::RuleConfig;
use crate::geometry::MIN_QUATERNION_NORM;
use crate::issue::{Issue, IssueKind};
use crate::regime::MotionRegime;
use crate::track::{Track, TrackSample};

/// Neighbors considered on each side of an anchor sample.
pub const LOOKBACK: usize = 2;

/// Weight of a neighbor by its offset from the anchor: `0.5^offset`.
const WEIGHTS: [f64; LOOKBACK] = [0.5, 0.25];

/// Intervals shorter than this (seconds) carry no usable speed.
const MIN_INTERVAL: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reference {
    World,
    Ego,
}

/// One inter-sample interval.
#[derive(Debug, Clone, Copy)]
struct Step {
    displacement: Vector2<f64>,
    dt: Option<f64>,
    speed: Option<f64>,
    regime: Option<MotionRegime>,
}

/// Heading and kinematic checks over object tracks.
///
/// `poses[i]` is the ego pose resolved for sample `i` of the track, or
/// `None` when no reliable pose exists. A shorter slice is treated as
/// missing poses for the remaining samples.
///
/// # Example
///
/// ```
/// use annotation_audit::{Frame, MotionValidator, RuleConfig, TrackBuilder};
/// use annotation_types::{AnnotatedObject, quaternion_from_yaw};
/// use std::f64::consts::FRAC_PI_2;
///
/// // Driving along +X while annotated as facing +Y
/// let frames: Vec<Frame> = (0..3u64)
///     .map(|i| {
///         let car = AnnotatedObject::new(format!("t{i}"), "vehicle.car", [0.6 * i as f64, 0.0, 0.0])
///             .with_instance("car")
///             .with_rotation(quaternion_from_yaw(FRAC_PI_2));
///         Frame::new(i, vec![car])
///     })
///     .collect();
///
/// let config = RuleConfig::standard();
/// let tracks = TrackBuilder::build(&frames);
/// let issues = MotionValidator::new(&config).check_track(&tracks[0], &[]);
///
/// assert_eq!(issues.len(), 3);
/// assert!(issues.iter().all(|i| i.kind.code() == "heading_mismatch"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MotionValidator<'c> {
    config: &'c RuleConfig,
}

impl<'c> MotionValidator<'c> {
    /// Creates a validator over a rule set.
    #[must_use]
    pub const fn new(config: &'c RuleConfig) -> Self {
        Self { config }
    }

    /// Returns true if the track is long enough and vehicle-like.
    #[must_use]
    pub fn applies_to(&self, track: &Track<'_>) -> bool {
        track.len() >= self.config.motion.min_track_len
            && track.class_name().is_some_and(|c| self.config.is_vehicle(c))
    }

    /// Runs every motion check on a track.
    ///
    /// Alignment findings come first, in sample order, followed by the
    /// kinematic findings.
    #[must_use]
    pub fn check_track(&self, track: &Track<'_>, poses: &[Option<EgoPose>]) -> Vec<Issue> {
        if !self.applies_to(track) {
            return Vec::new();
        }

        let samples = track.samples();
        let mut issues: Vec<Issue> = (0..samples.len())
            .filter_map(|k| {
                let kind = self.check_alignment(track, poses, k)?;
                let sample = &samples[k];
                Some(Issue::new(sample.frame, sample.object, kind))
            })
            .collect();
        issues.extend(self.check_kinematics(track, poses));
        issues
    }

    /// Compares the annotated heading of sample `index` with its direction
    /// of travel.
    ///
    /// Returns `None` when the heading is consistent, when the object moves
    /// backwards while static, or when the check does not apply (short or
    /// non-vehicle track, no rotation, no usable neighbor, displacement
    /// below the regime minimum, zero elapsed time).
    #[must_use]
    pub fn check_alignment(
        &self,
        track: &Track<'_>,
        poses: &[Option<EgoPose>],
        index: usize,
    ) -> Option<IssueKind> {
        if track.len() < self.config.motion.min_track_len {
            return None;
        }
        let samples = track.samples();
        let anchor = samples.get(index)?;
        if !self.config.is_vehicle(&anchor.object.class_name) {
            return None;
        }
        let object_yaw = usable_yaw(anchor.object)?;
        let thresholds = &self.config.motion;

        let anchor_pose = pose_at(poses, index);
        let reference = if anchor_pose.is_some() {
            Reference::World
        } else {
            Reference::Ego
        };
        let position = |i: usize| {
            samples
                .get(i)
                .and_then(|s| planar_position(s.object, pose_at(poses, i), reference))
        };
        let anchor_position = position(index)?;

        let backward = (1..=LOOKBACK)
            .filter_map(|offset| index.checked_sub(offset))
            .find(|&i| position(i).is_some());
        let forward = (1..=LOOKBACK)
            .map(|offset| index + offset)
            .take_while(|&i| i < samples.len())
            .find(|&i| position(i).is_some());

        let (start, end) = match (backward, forward) {
            (None, None) => return None,
            (b, f) => (b.unwrap_or(index), f.unwrap_or(index)),
        };
        let motion = position(end)? - position(start)?;

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (offset, weight) in (1..=LOOKBACK).zip(WEIGHTS) {
            let neighbors = [index.checked_sub(offset), Some(index + offset)];
            for i in neighbors.into_iter().flatten() {
                let (Some(sample), Some(p)) = (samples.get(i), position(i)) else {
                    continue;
                };
                let dt = anchor.seconds_until(sample, thresholds.frame_interval).abs();
                if dt < MIN_INTERVAL {
                    continue;
                }
                weighted += weight * (p - anchor_position).norm() / dt;
                total_weight += weight;
            }
        }
        let speed = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            let dt = samples[start]
                .seconds_until(&samples[end], thresholds.frame_interval)
                .abs();
            if dt < MIN_INTERVAL {
                return None;
            }
            motion.norm() / dt
        };

        let regime = MotionRegime::classify(speed, thresholds);
        if motion.norm() < thresholds.profile(regime).min_displacement {
            return None;
        }

        let motion_heading = motion.y.atan2(motion.x);
        let heading = match anchor_pose {
            Some(pose) => {
                CoordinateTransformer::heading_to_world(pose, object_yaw, self.config.pose.yaw_source)
            }
            None => normalize_angle(object_yaw),
        };
        let delta = normalize_angle(motion_heading - heading).abs();
        let tolerance = thresholds.tolerance(regime);

        if delta <= tolerance {
            None
        } else if PI - delta <= tolerance {
            (regime != MotionRegime::Static).then_some(IssueKind::ReverseMotion {
                delta,
                speed,
                regime,
            })
        } else {
            Some(IssueKind::HeadingMismatch {
                delta,
                speed,
                regime,
            })
        }
    }

    /// Checks speed, acceleration, regime stability, static jumps,
    /// direction changes and turn rate along a track.
    ///
    /// Each finding is attached to the sample that ends the offending
    /// interval; regime instability is attached to the first sample.
    #[must_use]
    pub fn check_kinematics(&self, track: &Track<'_>, poses: &[Option<EgoPose>]) -> Vec<Issue> {
        if !self.applies_to(track) {
            return Vec::new();
        }
        let samples = track.samples();
        let thresholds = &self.config.motion;

        // World frame only if every sample has a pose; mixing frames along
        // one track would fabricate displacements.
        let world: Option<Vec<&EgoPose>> = (0..samples.len()).map(|i| pose_at(poses, i)).collect();
        if world.is_none() {
            debug!(
                instance = track.instance_token(),
                "Missing poses, checking kinematics in ego frame"
            );
        }
        let positions: Vec<Vector2<f64>> = samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let pose = world.as_ref().map(|w| w[i]);
                let p = match pose {
                    Some(pose) => CoordinateTransformer::ego_to_world(pose, s.object.translation),
                    None => Vector3::from(s.object.translation),
                };
                Vector2::new(p.x, p.y)
            })
            .collect();
        let headings: Vec<Option<f64>> = samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let yaw = usable_yaw(s.object)?;
                Some(match world.as_ref().map(|w| w[i]) {
                    Some(pose) => {
                        CoordinateTransformer::heading_to_world(pose, yaw, self.config.pose.yaw_source)
                    }
                    None => normalize_angle(yaw),
                })
            })
            .collect();

        let steps: Vec<Step> = samples
            .windows(2)
            .zip(positions.windows(2))
            .map(|(s, p)| self.step(&s[0], &s[1], p[1] - p[0]))
            .collect();

        let mut issues = Vec::new();
        let mut report = |end: usize, kind: IssueKind| {
            let sample = &samples[end];
            issues.push(Issue::new(sample.frame, sample.object, kind));
        };

        for (i, step) in steps.iter().enumerate() {
            let end = i + 1;

            if let Some(speed) = step.speed.filter(|&v| v > thresholds.max_speed) {
                report(end, IssueKind::TrajectoryDiscontinuity { speed });
            }

            if let (Some(h0), Some(h1), Some(dt)) = (headings[i], headings[end], step.dt) {
                let rate = normalize_angle(h1 - h0).abs() / dt;
                if rate > thresholds.max_turn_rate {
                    report(end, IssueKind::ExcessiveTurnRate { rate });
                }
            }

            let Some(prev) = i.checked_sub(1).map(|p| &steps[p]) else {
                continue;
            };

            if let (Some(v0), Some(v1), Some(dt0), Some(dt1)) =
                (prev.speed, step.speed, prev.dt, step.dt)
            {
                let acceleration = (v1 - v0).abs() / (0.5 * (dt0 + dt1));
                if acceleration > thresholds.max_acceleration {
                    report(end, IssueKind::ExcessiveAcceleration { acceleration });
                }
            }

            let distance = step.displacement.norm();
            if prev.regime == Some(MotionRegime::Static) && distance > thresholds.static_jump_distance {
                report(end, IssueKind::StaticPositionJump { distance });
            }

            if let (Some(r0), Some(r1)) = (prev.regime, step.regime) {
                let d0 = prev.displacement.norm();
                if d0 >= thresholds.profile(r0).min_displacement
                    && distance >= thresholds.profile(r1).min_displacement
                {
                    let cos = (prev.displacement.dot(&step.displacement) / (d0 * distance)).clamp(-1.0, 1.0);
                    let angle = cos.acos();
                    if angle > thresholds.max_direction_change {
                        report(end, IssueKind::AbruptDirectionChange { angle });
                    }
                }
            }
        }

        let regimes: Vec<MotionRegime> = steps.iter().filter_map(|s| s.regime).collect();
        let switches = regimes.windows(2).filter(|w| w[0] != w[1]).count();
        let intervals = regimes.len();
        #[allow(clippy::cast_precision_loss)]
        let ratio = if intervals == 0 {
            0.0
        } else {
            switches as f64 / intervals as f64
        };
        if ratio > thresholds.max_regime_switch_ratio {
            report(
                0,
                IssueKind::UnstableMotionState {
                    switches,
                    intervals,
                },
            );
        }

        issues
    }

    fn step(&self, from: &TrackSample<'_>, to: &TrackSample<'_>, displacement: Vector2<f64>) -> Step {
        let dt = from.seconds_until(to, self.config.motion.frame_interval).abs();
        let dt = (dt >= MIN_INTERVAL).then_some(dt);
        let speed = dt.map(|dt| displacement.norm() / dt);
        Step {
            displacement,
            dt,
            speed,
            regime: speed.map(|v| MotionRegime::classify(v, &self.config.motion)),
        }
    }
}

fn pose_at(poses: &[Option<EgoPose>], index: usize) -> Option<&EgoPose> {
    poses.get(index).and_then(Option::as_ref)
}

fn usable_yaw(object: &AnnotatedObject) -> Option<f64> {
    let rotation = object.rotation?;
    if quaternion_norm(rotation) < MIN_QUATERNION_NORM {
        return None;
    }
    object.yaw()
}

fn planar_position(
    object: &AnnotatedObject,
    pose: Option<&EgoPose>,
    reference: Reference,
) -> Option<Vector2<f64>> {
    let p = match reference {
        Reference::World => CoordinateTransformer::ego_to_world(pose?, object.translation),
        Reference::Ego => Vector3::from(object.translation),
    };
    Some(Vector2::new(p.x, p.y))
}
