//! Per-object geometric checks.

use annotation_types::{AnnotatedObject, FrameId, euler_angles, quaternion_norm};

use crate::config::RuleConfig;
use crate::issue::{Issue, IssueKind, SizeAxis};

/// Quaternions with a smaller norm carry no usable orientation.
pub(crate) const MIN_QUATERNION_NORM: f64 = 1e-9;

/// Checks a single annotation against the point, size and attitude rules.
///
/// Each check runs independently, so one object can collect several
/// findings. A missing size or rotation skips the checks that need it.
/// Roll and pitch limits apply to vehicle-like classes only.
///
/// # Example
///
/// ```
/// use annotation_audit::{GeometryValidator, IssueKind, RuleConfig};
/// use annotation_types::{AnnotatedObject, BoxSize};
///
/// let config = RuleConfig::standard();
/// let validator = GeometryValidator::new(&config);
///
/// let car = AnnotatedObject::new("a", "vehicle.car", [0.0; 3])
///     .with_size(BoxSize::new(4.5, 1.8, 1.5))
///     .with_rotation([1.0, 0.0, 0.0, 0.0])
///     .with_points(2);
///
/// let issues = validator.check(&car);
/// assert_eq!(issues.len(), 1);
/// assert!(matches!(issues[0], IssueKind::LowPointCount { count: 2, .. }));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GeometryValidator<'c> {
    config: &'c RuleConfig,
}

impl<'c> GeometryValidator<'c> {
    /// Creates a validator over a rule set.
    #[must_use]
    pub const fn new(config: &'c RuleConfig) -> Self {
        Self { config }
    }

    /// Returns every geometric finding for an object.
    #[must_use]
    pub fn check(&self, object: &AnnotatedObject) -> Vec<IssueKind> {
        let mut issues = Vec::new();
        self.check_points(object, &mut issues);
        self.check_size(object, &mut issues);
        self.check_attitude(object, &mut issues);
        issues
    }

    /// Like [`check`](Self::check), with findings attached to the object.
    #[must_use]
    pub fn check_in_frame(&self, frame: &FrameId, object: &AnnotatedObject) -> Vec<Issue> {
        self.check(object)
            .into_iter()
            .map(|kind| Issue::new(frame, object, kind))
            .collect()
    }

    fn check_points(&self, object: &AnnotatedObject, issues: &mut Vec<IssueKind>) {
        let min = self.config.min_lidar_points;
        if object.num_points < min {
            issues.push(IssueKind::LowPointCount {
                count: object.num_points,
                min,
            });
        }
    }

    fn check_size(&self, object: &AnnotatedObject, issues: &mut Vec<IssueKind>) {
        let Some(size) = object.size else {
            return;
        };
        let Some(rule) = self.config.size_rule_for(&object.class_name) else {
            return;
        };

        for (axis, value, bounds) in [
            (SizeAxis::Length, size.length, rule.length),
            (SizeAxis::Width, size.width, rule.width),
            (SizeAxis::Height, size.height, rule.height),
        ] {
            if !bounds.contains(value) {
                issues.push(IssueKind::SizeOutOfRange {
                    axis,
                    value,
                    min: bounds.min,
                    max: bounds.max,
                    rule: rule.name.clone(),
                });
            }
        }
    }

    fn check_attitude(&self, object: &AnnotatedObject, issues: &mut Vec<IssueKind>) {
        let Some(rotation) = object.rotation else {
            return;
        };
        let limits = &self.config.attitude;

        let norm = quaternion_norm(rotation);
        // Strictly greater: a deviation equal to the tolerance passes
        if (norm - 1.0).abs() > limits.norm_tolerance {
            issues.push(IssueKind::QuaternionNotNormalized { norm });
        }

        // Attitude limits describe ground vehicles sitting flat
        if norm < MIN_QUATERNION_NORM || !self.config.is_vehicle(&object.class_name) {
            return;
        }
        let (roll, pitch, _) = euler_angles(rotation);
        if roll.abs() > limits.max_roll {
            issues.push(IssueKind::ExcessiveRoll { roll });
        }
        if pitch.abs() > limits.max_pitch {
            issues.push(IssueKind::ExcessivePitch { pitch });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use annotation_types::{BoxSize, quaternion_from_yaw};
    use approx::assert_relative_eq;

    fn car() -> AnnotatedObject {
        AnnotatedObject::new("a", "vehicle.car", [0.0; 3])
            .with_size(BoxSize::new(4.5, 1.8, 1.5))
            .with_rotation([1.0, 0.0, 0.0, 0.0])
            .with_points(100)
    }

    fn roll_quaternion(roll: f64) -> [f64; 4] {
        [(roll / 2.0).cos(), (roll / 2.0).sin(), 0.0, 0.0]
    }

    #[test]
    fn clean_object() {
        let config = RuleConfig::standard();
        assert!(GeometryValidator::new(&config).check(&car()).is_empty());
    }

    #[test]
    fn point_minimum_is_inclusive() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        assert!(v.check(&car().with_points(5)).is_empty());
        assert_eq!(v.check(&car().with_points(4)).len(), 1);
    }

    #[test]
    fn each_axis_reported() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        let issues = v.check(&car().with_size(BoxSize::new(20.0, 0.5, 1.5)));
        assert_eq!(issues.len(), 2);
        assert!(matches!(
            &issues[0],
            IssueKind::SizeOutOfRange { axis: SizeAxis::Length, rule, .. } if rule == "vehicle"
        ));
        assert!(matches!(issues[1], IssueKind::SizeOutOfRange { axis: SizeAxis::Width, .. }));
    }

    #[test]
    fn size_bounds_inclusive() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        assert!(v.check(&car().with_size(BoxSize::new(2.0, 3.0, 4.5))).is_empty());
    }

    #[test]
    fn first_matching_rule_applies() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        // A bicycle is sized as a cyclist, not as a vehicle
        let bike = AnnotatedObject::new("b", "vehicle.bicycle", [0.0; 3])
            .with_size(BoxSize::new(1.8, 0.6, 1.7))
            .with_points(50);
        assert!(v.check(&bike).is_empty());
    }

    #[test]
    fn unmatched_class_skips_size() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        let animal = AnnotatedObject::new("x", "animal", [0.0; 3])
            .with_size(BoxSize::new(50.0, 50.0, 50.0))
            .with_points(50);
        assert!(v.check(&animal).is_empty());
    }

    #[test]
    fn missing_size_and_rotation_skip_checks() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        let bare = AnnotatedObject::new("x", "vehicle.car", [0.0; 3]).with_points(10);
        assert!(v.check(&bare).is_empty());
    }

    #[test]
    fn norm_tolerance_boundary() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        assert!(v.check(&car().with_rotation([1.005, 0.0, 0.0, 0.0])).is_empty());

        let issues = v.check(&car().with_rotation([1.02, 0.0, 0.0, 0.0]));
        assert_eq!(issues.len(), 1);
        match issues[0] {
            IssueKind::QuaternionNotNormalized { norm } => assert_relative_eq!(norm, 1.02),
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pure_yaw_has_no_attitude_issue() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        for yaw in [-3.0, -1.0, 0.0, 1.5, 3.1] {
            assert!(v.check(&car().with_rotation(quaternion_from_yaw(yaw))).is_empty());
        }
    }

    #[test]
    fn excessive_roll_and_pitch() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);

        let issues = v.check(&car().with_rotation(roll_quaternion(0.6)));
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], IssueKind::ExcessiveRoll { roll } if (roll - 0.6).abs() < 1e-9));

        let pitch = [(0.35f64).cos(), 0.0, (0.35f64).sin(), 0.0];
        let issues = v.check(&car().with_rotation(pitch));
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], IssueKind::ExcessivePitch { .. }));
    }

    #[test]
    fn attitude_limits_vehicles_only() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        let sign = AnnotatedObject::new("s", "static_object.sign", [0.0; 3])
            .with_size(BoxSize::new(0.5, 0.5, 2.0))
            .with_rotation(roll_quaternion(1.0))
            .with_points(30);
        assert!(v.check(&sign).is_empty());
    }

    #[test]
    fn zero_quaternion_reports_norm_only() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        let issues = v.check(&car().with_rotation([0.0; 4]));
        assert_eq!(issues, vec![IssueKind::QuaternionNotNormalized { norm: 0.0 }]);
    }

    #[test]
    fn independent_checks_accumulate() {
        let config = RuleConfig::standard();
        let v = GeometryValidator::new(&config);
        let bad = car()
            .with_points(0)
            .with_size(BoxSize::new(4.5, 1.8, 9.0))
            .with_rotation(roll_quaternion(1.0));
        let issues = v.check_in_frame(&FrameId::from(3u64), &bad);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.frame.as_str() == "3" && i.object_token == "a"));
    }
}
