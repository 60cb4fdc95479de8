//! Ego-pose resolution at arbitrary timestamps.

use annotation_types::{Duration, EgoPose, Timestamp, normalize_angle, quaternion_norm};
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};
use crate::pose_log::{Bracket, PoseLog};

/// Largest gap to a log entry that still yields a pose.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_millis(100);

/// How a pose is produced when no entry matches a timestamp exactly.
///
/// An exact match is always returned as-is in every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Use the closest entry within tolerance.
    Nearest,

    /// Interpolate between the bracketing entries when both are within
    /// tolerance; fall back to nearest when the target is outside the log.
    #[default]
    Interpolated,
}

/// Configuration for [`PoseResolver`].
///
/// # Example
///
/// ```
/// use annotation_fusion::{ResolveMode, ResolverConfig};
/// use annotation_types::Duration;
///
/// let config = ResolverConfig::default()
///     .with_mode(ResolveMode::Nearest)
///     .with_tolerance(Duration::from_millis(50));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Resolution strategy.
    pub mode: ResolveMode,
    /// Maximum distance in time from the target to any entry used.
    pub tolerance: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mode: ResolveMode::Interpolated,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ResolverConfig {
    /// Sets the resolution strategy.
    #[must_use]
    pub const fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is zero.
    pub fn validate(&self) -> Result<()> {
        if self.tolerance.is_zero() {
            return Err(FusionError::invalid_config("pose tolerance must be positive"));
        }
        Ok(())
    }
}

/// Resolves the ego pose at a target timestamp from a sparse [`PoseLog`].
///
/// Returns `None` whenever the estimate would be unreliable: no entry within
/// the tolerance, or a bracketing entry too far away to interpolate from.
///
/// # Orientation Interpolation
///
/// Orientation is interpolated component-wise and renormalized. This is an
/// approximation to spherical interpolation that is accurate only for the
/// short gaps and low angular rates the tolerance allows; heading tolerances
/// downstream are tuned against it.
///
/// # Example
///
/// ```
/// use annotation_fusion::{PoseLog, PoseResolver, ResolverConfig};
/// use annotation_types::{EgoPose, Timestamp};
///
/// let log = PoseLog::new(vec![
///     EgoPose::from_translation(Timestamp::from_millis(0), [0.0, 0.0, 0.0]),
///     EgoPose::from_translation(Timestamp::from_millis(100), [1.0, 0.0, 0.0]),
/// ])
/// .unwrap();
/// let resolver = PoseResolver::new(&log, ResolverConfig::default());
///
/// let mid = resolver.resolve(Timestamp::from_millis(50)).unwrap();
/// assert!((mid.position[0] - 0.5).abs() < 1e-9);
/// assert!(resolver.resolve(Timestamp::from_millis(300)).is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PoseResolver<'a> {
    log: &'a PoseLog,
    config: ResolverConfig,
}

impl<'a> PoseResolver<'a> {
    /// Creates a resolver over `log`.
    #[must_use]
    pub const fn new(log: &'a PoseLog, config: ResolverConfig) -> Self {
        Self { log, config }
    }

    /// Returns the resolver configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the underlying log.
    #[must_use]
    pub const fn log(&self) -> &'a PoseLog {
        self.log
    }

    /// Resolves the pose at `timestamp`.
    #[must_use]
    pub fn resolve(&self, timestamp: Timestamp) -> Option<EgoPose> {
        if let Some(exact) = self.log.exact(timestamp) {
            return Some(*exact);
        }

        match self.config.mode {
            ResolveMode::Nearest => self.resolve_nearest(timestamp),
            ResolveMode::Interpolated => self.resolve_interpolated(timestamp),
        }
    }

    fn within_tolerance(&self, a: Timestamp, b: Timestamp) -> bool {
        a.abs_diff(b) <= self.config.tolerance
    }

    fn resolve_nearest(&self, timestamp: Timestamp) -> Option<EgoPose> {
        let nearest = self.log.nearest(timestamp)?;
        self.within_tolerance(nearest.timestamp, timestamp)
            .then_some(*nearest)
    }

    fn resolve_interpolated(&self, timestamp: Timestamp) -> Option<EgoPose> {
        let Bracket { before, after } = self.log.find_bracket(timestamp);
        let (Some(before), Some(after)) = (
            before.and_then(|i| self.log.get(i)),
            after.and_then(|i| self.log.get(i)),
        ) else {
            // Target lies outside the log: only one neighbor exists
            return self.resolve_nearest(timestamp);
        };

        if !self.within_tolerance(before.timestamp, timestamp)
            || !self.within_tolerance(after.timestamp, timestamp)
        {
            return None;
        }

        let span = after.timestamp.seconds_since(before.timestamp);
        if span <= 0.0 {
            return Some(*before);
        }
        let t = timestamp.seconds_since(before.timestamp) / span;

        Some(interpolate_pose(before, after, t, timestamp))
    }
}

/// Interpolates between two poses at ratio `t` in `[0, 1]`.
///
/// The result is stamped with `timestamp`.
#[must_use]
pub fn interpolate_pose(before: &EgoPose, after: &EgoPose, t: f64, timestamp: Timestamp) -> EgoPose {
    let position = std::array::from_fn(|i| lerp(before.position[i], after.position[i], t));

    // Take the shorter arc: q and -q encode the same rotation
    let dot: f64 = before
        .orientation
        .iter()
        .zip(after.orientation.iter())
        .map(|(a, b)| a * b)
        .sum();
    let sign = if dot < 0.0 { -1.0 } else { 1.0 };
    let blended: [f64; 4] =
        std::array::from_fn(|i| lerp(before.orientation[i], sign * after.orientation[i], t));

    let nearer = if t <= 0.5 { before } else { after };
    let norm = quaternion_norm(blended);
    let orientation = if norm > 1e-9 {
        blended.map(|c| c / norm)
    } else {
        nearer.orientation
    };

    let azimuth = match (before.azimuth, after.azimuth) {
        (Some(a), Some(b)) => Some(normalize_angle(t.mul_add(normalize_angle(b - a), a))),
        _ => nearer.azimuth,
    };

    EgoPose {
        timestamp,
        position,
        orientation,
        azimuth,
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    t.mul_add(b - a, a)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use annotation_types::{quaternion_from_yaw, yaw_from_quaternion};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn pose_at(millis: u64, x: f64) -> EgoPose {
        EgoPose::from_translation(Timestamp::from_millis(millis), [x, 0.0, 0.0])
    }

    fn two_pose_log() -> PoseLog {
        PoseLog::new(vec![pose_at(0, 0.0), pose_at(100, 1.0)]).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.mode, ResolveMode::Interpolated);
        assert_eq!(config.tolerance, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_zero_tolerance() {
        let config = ResolverConfig::default().with_tolerance(Duration::from_nanos(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_snake_case_mode() {
        let json = r#"{"mode":"nearest","tolerance":50000000}"#;
        let config: ResolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, ResolveMode::Nearest);
        assert_eq!(config.tolerance, Duration::from_millis(50));
    }

    #[test]
    fn config_rejects_unknown_and_missing_keys() {
        let typo = r#"{"mode":"nearest","tolerence":50000000}"#;
        assert!(serde_json::from_str::<ResolverConfig>(typo).is_err());

        let partial = r#"{"mode":"nearest"}"#;
        assert!(serde_json::from_str::<ResolverConfig>(partial).is_err());
    }

    #[test]
    fn exact_match_returned_directly() {
        let log = two_pose_log();
        for mode in [ResolveMode::Nearest, ResolveMode::Interpolated] {
            let resolver = PoseResolver::new(&log, ResolverConfig::default().with_mode(mode));
            let pose = resolver.resolve(Timestamp::from_millis(100)).unwrap();
            assert_eq!(pose, pose_at(100, 1.0));
        }
    }

    #[test]
    fn interpolated_midpoint() {
        let log = two_pose_log();
        let resolver = PoseResolver::new(&log, ResolverConfig::default());
        let pose = resolver.resolve(Timestamp::from_millis(50)).unwrap();
        assert_relative_eq!(pose.position[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(pose.position[1], 0.0);
        assert_eq!(pose.timestamp, Timestamp::from_millis(50));
    }

    #[test]
    fn interpolated_outside_log_uses_nearest_with_tolerance() {
        let log = two_pose_log();
        let resolver = PoseResolver::new(&log, ResolverConfig::default());
        let pose = resolver.resolve(Timestamp::from_millis(180)).unwrap();
        assert_eq!(pose.position[0], 1.0);
        assert!(resolver.resolve(Timestamp::from_millis(300)).is_none());
    }

    #[test]
    fn interpolated_rejects_wide_bracket() {
        let log = PoseLog::new(vec![pose_at(0, 0.0), pose_at(300, 3.0)]).unwrap();
        let resolver = PoseResolver::new(&log, ResolverConfig::default());
        // 50 ms from the earlier entry but 250 ms from the later one
        assert!(resolver.resolve(Timestamp::from_millis(50)).is_none());
        assert!(resolver.resolve(Timestamp::from_millis(150)).is_none());
    }

    #[test]
    fn nearest_mode_within_and_beyond_tolerance() {
        let log = PoseLog::new(vec![pose_at(0, 0.0), pose_at(300, 3.0)]).unwrap();
        let resolver =
            PoseResolver::new(&log, ResolverConfig::default().with_mode(ResolveMode::Nearest));
        assert_eq!(resolver.resolve(Timestamp::from_millis(80)).unwrap().position[0], 0.0);
        assert_eq!(resolver.resolve(Timestamp::from_millis(220)).unwrap().position[0], 3.0);
        assert!(resolver.resolve(Timestamp::from_millis(150)).is_none());
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let log = two_pose_log();
        let resolver =
            PoseResolver::new(&log, ResolverConfig::default().with_mode(ResolveMode::Nearest));
        assert!(resolver.resolve(Timestamp::from_millis(200)).is_some());
        assert!(resolver.resolve(Timestamp::from_nanos(200_000_001)).is_none());
    }

    #[test]
    fn empty_log_resolves_nothing() {
        let log = PoseLog::default();
        let resolver = PoseResolver::new(&log, ResolverConfig::default());
        assert!(resolver.resolve(Timestamp::from_millis(0)).is_none());
    }

    #[test]
    fn orientation_interpolates_and_renormalizes() {
        let a = EgoPose::new(Timestamp::from_millis(0), [0.0; 3], quaternion_from_yaw(0.0));
        let b = EgoPose::new(Timestamp::from_millis(100), [0.0; 3], quaternion_from_yaw(0.2));
        let mid = interpolate_pose(&a, &b, 0.5, Timestamp::from_millis(50));
        assert_relative_eq!(quaternion_norm(mid.orientation), 1.0, epsilon = 1e-12);
        assert_relative_eq!(yaw_from_quaternion(mid.orientation), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn orientation_takes_shorter_arc() {
        let a = EgoPose::new(Timestamp::from_millis(0), [0.0; 3], quaternion_from_yaw(0.1));
        let flipped = quaternion_from_yaw(0.3).map(|c| -c);
        let b = EgoPose::new(Timestamp::from_millis(100), [0.0; 3], flipped);
        let mid = interpolate_pose(&a, &b, 0.5, Timestamp::from_millis(50));
        assert_relative_eq!(yaw_from_quaternion(mid.orientation), 0.2, epsilon = 1e-9);
    }

    #[test]
    fn azimuth_interpolates_across_wrap() {
        let a = pose_at(0, 0.0).with_azimuth(PI - 0.1);
        let b = pose_at(100, 0.0).with_azimuth(-PI + 0.1);
        let mid = interpolate_pose(&a, &b, 0.5, Timestamp::from_millis(50));
        assert_relative_eq!(mid.azimuth.unwrap().abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn azimuth_from_nearer_when_one_missing() {
        let a = pose_at(0, 0.0).with_azimuth(0.3);
        let b = pose_at(100, 0.0);
        assert_eq!(interpolate_pose(&a, &b, 0.2, Timestamp::from_millis(20)).azimuth, Some(0.3));
        assert_eq!(interpolate_pose(&a, &b, 0.8, Timestamp::from_millis(80)).azimuth, None);
    }
}
