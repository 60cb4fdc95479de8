//! Sequence-level audit driver.

use annotation_fusion::{PoseLog, PoseResolver};
use annotation_types::{EgoPose, FrameId};
use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::catalog::SequenceCatalog;
use crate::config::RuleConfig;
use crate::error::Result;
use crate::geometry::GeometryValidator;
use crate::issue::Issue;
use crate::motion::MotionValidator;
use crate::report::{AuditReport, AuditSummary};
use crate::track::{Track, TrackBuilder};

/// Execution options that do not change results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditOptions {
    /// Check frames and tracks on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl AuditOptions {
    /// Enables or disables parallel checking.
    ///
    /// Reports are identical either way.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Runs every check over one sequence.
///
/// The auditor resolves an ego pose per frame (from the frame timestamp,
/// or by position in the log when the frame has none and index fallback is
/// enabled) and per sample (object timestamp first, then its frame's pose),
/// runs [`GeometryValidator`] on every object and [`MotionValidator`] on
/// every track, and merges the findings into one ordered report.
///
/// # Example
///
/// ```
/// use annotation_audit::{Frame, RuleConfig, SequenceAuditor, SequenceCatalog};
/// use annotation_fusion::PoseLog;
/// use annotation_types::{AnnotatedObject, BoxSize};
///
/// let car = AnnotatedObject::new("a", "vehicle.car", [5.0, 0.0, 0.0])
///     .with_size(BoxSize::new(4.5, 1.8, 1.5))
///     .with_rotation([1.0, 0.0, 0.0, 0.0])
///     .with_points(40);
/// let catalog = SequenceCatalog::new(vec![Frame::new("0", vec![car])]);
///
/// let auditor = SequenceAuditor::new(RuleConfig::standard()).unwrap();
/// let report = auditor.audit(&catalog, &PoseLog::default());
///
/// assert!(report.is_clean());
/// assert_eq!(report.summary().pass_rate, 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct SequenceAuditor {
    config: RuleConfig,
    options: AuditOptions,
}

impl SequenceAuditor {
    /// Creates an auditor over a validated rule set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RuleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            options: AuditOptions::default(),
        })
    }

    /// Sets the execution options.
    #[must_use]
    pub const fn with_options(mut self, options: AuditOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the rule set.
    #[must_use]
    pub const fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Returns the execution options.
    #[must_use]
    pub const fn options(&self) -> AuditOptions {
        self.options
    }

    /// Resolves one ego pose per catalog frame.
    #[must_use]
    pub fn frame_poses(&self, catalog: &SequenceCatalog, log: &PoseLog) -> Vec<Option<EgoPose>> {
        let resolver = PoseResolver::new(log, self.config.pose.resolver);
        catalog
            .frames()
            .iter()
            .enumerate()
            .map(|(index, frame)| match frame.timestamp {
                Some(ts) => resolver.resolve(ts),
                None if self.config.pose.index_fallback => log.get(index).copied(),
                None => None,
            })
            .collect()
    }

    /// Audits a sequence.
    #[must_use]
    pub fn audit(&self, catalog: &SequenceCatalog, log: &PoseLog) -> AuditReport {
        info!(
            frames = catalog.len(),
            objects = catalog.object_count(),
            poses = log.len(),
            parallel = self.options.parallel,
            "Auditing sequence"
        );

        let frame_poses = self.frame_poses(catalog, log);
        let resolved = frame_poses.iter().filter(|p| p.is_some()).count();
        debug!(resolved, frames = frame_poses.len(), "Resolved frame poses");

        let geometry = GeometryValidator::new(&self.config);
        let frames = catalog.frames();
        let geometry_issues: Vec<Issue> = if self.options.parallel {
            frames
                .par_iter()
                .flat_map_iter(|f| f.objects.iter().flat_map(move |o| geometry.check_in_frame(&f.id, o)))
                .collect()
        } else {
            frames
                .iter()
                .flat_map(|f| f.objects.iter().flat_map(move |o| geometry.check_in_frame(&f.id, o)))
                .collect()
        };

        let tracks = TrackBuilder::build(frames);
        let motion = MotionValidator::new(&self.config);
        let checked_tracks = tracks.iter().filter(|t| motion.applies_to(t)).count();
        let resolver = PoseResolver::new(log, self.config.pose.resolver);
        let check_track = |track: &Track<'_>| {
            let poses: Vec<Option<EgoPose>> = track
                .samples()
                .iter()
                .map(|s| match s.object.timestamp {
                    Some(ts) => resolver.resolve(ts),
                    None => frame_poses.get(s.frame_index).copied().flatten(),
                })
                .collect();
            motion.check_track(track, &poses)
        };
        let motion_issues: Vec<Issue> = if self.options.parallel {
            tracks.par_iter().flat_map_iter(check_track).collect()
        } else {
            tracks.iter().flat_map(check_track).collect()
        };

        let mut issues = geometry_issues;
        issues.extend(motion_issues);
        sort_issues(catalog, &mut issues);

        let summary = AuditSummary::compute(
            catalog,
            &issues,
            tracks.len(),
            checked_tracks,
            !log.is_empty(),
        );
        info!(
            issues = issues.len(),
            issue_frames = summary.issue_frames,
            pass_rate = summary.pass_rate,
            "Audit complete"
        );
        AuditReport::new(issues, summary)
    }
}

/// Orders findings by frame position, then object position within the
/// frame. The sort is stable, so geometry findings precede motion findings
/// for the same object and each family keeps its own order.
fn sort_issues(catalog: &SequenceCatalog, issues: &mut [Issue]) {
    let mut positions: HashMap<(&FrameId, &str), (usize, usize)> = HashMap::new();
    for (frame_index, frame) in catalog.frames().iter().enumerate() {
        for (object_index, object) in frame.objects.iter().enumerate() {
            positions
                .entry((&frame.id, object.token.as_str()))
                .or_insert((frame_index, object_index));
        }
    }
    issues.sort_by_key(|issue| {
        positions
            .get(&(&issue.frame, issue.object_token.as_str()))
            .copied()
            .unwrap_or((usize::MAX, usize::MAX))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::catalog::Frame;
    use crate::error::AuditError;
    use annotation_types::{AnnotatedObject, BoxSize, Timestamp};

    fn car(token: &str, x: f64) -> AnnotatedObject {
        AnnotatedObject::new(token, "vehicle.car", [x, 0.0, 0.0])
            .with_instance("car")
            .with_size(BoxSize::new(4.5, 1.8, 1.5))
            .with_rotation([1.0, 0.0, 0.0, 0.0])
            .with_points(50)
    }

    fn log_at(millis: &[u64]) -> PoseLog {
        PoseLog::new(millis.iter().map(|&ms| {
            #[allow(clippy::cast_precision_loss)]
            let x = ms as f64;
            EgoPose::from_translation(Timestamp::from_millis(ms), [x, 0.0, 0.0])
        }))
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = RuleConfig::standard();
        config.size_rules.clear();
        assert!(matches!(SequenceAuditor::new(config), Err(AuditError::InvalidConfig(_))));
    }

    #[test]
    fn frame_poses_by_timestamp_and_index() {
        let auditor = SequenceAuditor::new(RuleConfig::standard()).unwrap();
        let log = log_at(&[0, 100, 200]);
        let catalog = SequenceCatalog::new(vec![
            Frame::new("0", vec![]).with_timestamp(Timestamp::from_millis(50)),
            Frame::new("1", vec![]),
            Frame::new("2", vec![]).with_timestamp(Timestamp::from_millis(900)),
        ]);
        let poses = auditor.frame_poses(&catalog, &log);
        assert!((poses[0].unwrap().position[0] - 50.0).abs() < 1e-9);
        // No timestamp: paired with the log entry at the same position
        assert_eq!(poses[1].unwrap().position[0], 100.0);
        // Timestamp outside tolerance: no pose, no index fallback
        assert!(poses[2].is_none());
    }

    #[test]
    fn index_fallback_can_be_disabled() {
        let mut config = RuleConfig::standard();
        config.pose.index_fallback = false;
        let auditor = SequenceAuditor::new(config).unwrap();
        let catalog = SequenceCatalog::new(vec![Frame::new("0", vec![])]);
        assert!(auditor.frame_poses(&catalog, &log_at(&[0]))[0].is_none());
    }

    #[test]
    fn issues_ordered_by_frame_then_object() {
        let auditor = SequenceAuditor::new(RuleConfig::standard()).unwrap();
        let catalog = SequenceCatalog::new(vec![
            Frame::new("1", vec![car("b", 0.0).with_points(0), car("a", 0.0).with_points(1)]),
            Frame::new("0", vec![car("z", 0.0).with_points(2)]),
        ]);
        let report = auditor.audit(&catalog, &PoseLog::default());
        let order: Vec<(&str, &str)> = report
            .issues()
            .iter()
            .map(|i| (i.frame.as_str(), i.object_token.as_str()))
            .collect();
        assert_eq!(order, vec![("0", "z"), ("1", "b"), ("1", "a")]);
    }

    #[test]
    fn parallel_and_serial_agree() {
        let frames: Vec<Frame> = (0..20u32)
            .map(|i| {
                let x = f64::from(i) * if i % 3 == 0 { 2.0 } else { 0.5 };
                Frame::new(u64::from(i), vec![car(&format!("t{i}"), x).with_points(i)])
            })
            .collect();
        let catalog = SequenceCatalog::new(frames);
        let log = PoseLog::default();

        let parallel = SequenceAuditor::new(RuleConfig::standard()).unwrap();
        let serial = parallel
            .clone()
            .with_options(AuditOptions::default().with_parallel(false));

        let a = parallel.audit(&catalog, &log);
        let b = serial.audit(&catalog, &log);
        assert_eq!(a.issues(), b.issues());
        assert_eq!(a.summary(), b.summary());
        assert!(!a.issues().is_empty());
    }

    #[test]
    fn summary_reflects_pose_availability() {
        let auditor = SequenceAuditor::new(RuleConfig::standard()).unwrap();
        let catalog = SequenceCatalog::new(vec![Frame::new("0", vec![car("a", 0.0)])]);
        assert!(!auditor.audit(&catalog, &PoseLog::default()).summary().pose_compensated);
        assert!(auditor.audit(&catalog, &log_at(&[0])).summary().pose_compensated);
    }
}
