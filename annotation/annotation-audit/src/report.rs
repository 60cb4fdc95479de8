//! Audit results and summary statistics.

use std::collections::BTreeMap;
use std::fmt;

use annotation_types::FrameId;
use hashbrown::HashSet;
use serde::Serialize;

use crate::catalog::SequenceCatalog;
use crate::error::{AuditError, Result};
use crate::issue::{Issue, IssueSeverity};

/// Headline numbers of one audit run.
///
/// Only warnings fail a frame; informational findings are counted
/// separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSummary {
    /// Frames in the catalog.
    pub total_frames: usize,
    /// Objects in the catalog.
    pub total_objects: usize,
    /// Tracks built from instance tokens.
    pub total_tracks: usize,
    /// Tracks that received motion checks.
    pub checked_tracks: usize,
    /// Frames with at least one warning.
    pub issue_frames: usize,
    /// Objects with at least one warning.
    pub issue_objects: usize,
    /// Warning count.
    pub warnings: usize,
    /// Informational finding count.
    pub infos: usize,
    /// Whether a non-empty pose log was available.
    pub pose_compensated: bool,
    /// Percentage of frames without warnings; 0 for an empty catalog.
    pub pass_rate: f64,
}

impl AuditSummary {
    pub(crate) fn compute(
        catalog: &SequenceCatalog,
        issues: &[Issue],
        total_tracks: usize,
        checked_tracks: usize,
        pose_compensated: bool,
    ) -> Self {
        let warnings: Vec<&Issue> = issues
            .iter()
            .filter(|i| i.severity() == IssueSeverity::Warning)
            .collect();
        let issue_frames: HashSet<&FrameId> = warnings.iter().map(|i| &i.frame).collect();
        let issue_objects: HashSet<(&FrameId, &str)> = warnings
            .iter()
            .map(|i| (&i.frame, i.object_token.as_str()))
            .collect();

        let total_frames = catalog.len();
        // Repeated frame ids collapse in the set, so count catalog frames
        let failed = catalog
            .frames()
            .iter()
            .filter(|f| issue_frames.contains(&f.id))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let pass_rate = if total_frames == 0 {
            0.0
        } else {
            (total_frames - failed) as f64 / total_frames as f64 * 100.0
        };

        Self {
            total_frames,
            total_objects: catalog.object_count(),
            total_tracks,
            checked_tracks,
            issue_frames: failed,
            issue_objects: issue_objects.len(),
            warnings: warnings.len(),
            infos: issues.len() - warnings.len(),
            pose_compensated,
            pass_rate,
        }
    }
}

/// Findings of one audit run, ordered by frame, then by object position
/// within the frame, then geometry before motion.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    summary: AuditSummary,
    issues: Vec<Issue>,
}

impl AuditReport {
    pub(crate) const fn new(issues: Vec<Issue>, summary: AuditSummary) -> Self {
        Self { summary, issues }
    }

    /// Returns every finding in report order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Returns the summary statistics.
    #[must_use]
    pub const fn summary(&self) -> &AuditSummary {
        &self.summary
    }

    /// Returns true if the run produced no warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.summary.warnings == 0
    }

    /// Returns findings of one severity.
    pub fn with_severity(&self, severity: IssueSeverity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity() == severity)
    }

    /// Returns findings attached to one object.
    pub fn issues_for<'s>(
        &'s self,
        frame: &'s FrameId,
        object_token: &'s str,
    ) -> impl Iterator<Item = &'s Issue> {
        self.issues
            .iter()
            .filter(move |i| &i.frame == frame && i.object_token == object_token)
    }

    /// Groups findings by frame, in report order.
    #[must_use]
    pub fn by_frame(&self) -> Vec<(&FrameId, Vec<&Issue>)> {
        let mut groups: Vec<(&FrameId, Vec<&Issue>)> = Vec::new();
        for issue in &self.issues {
            match groups.last_mut() {
                Some((frame, list)) if *frame == &issue.frame => list.push(issue),
                _ => groups.push((&issue.frame, vec![issue])),
            }
        }
        groups
    }

    /// Counts findings per issue code.
    #[must_use]
    pub fn count_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind.code()).or_insert(0) += 1;
        }
        counts
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AuditError::parse(e.to_string()))
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(
            f,
            "frames: {} ({} with warnings, pass rate {:.1}%)",
            s.total_frames, s.issue_frames, s.pass_rate
        )?;
        writeln!(
            f,
            "objects: {} ({} with warnings), tracks: {} ({} checked)",
            s.total_objects, s.issue_objects, s.total_tracks, s.checked_tracks
        )?;
        writeln!(
            f,
            "pose compensation: {}",
            if s.pose_compensated { "on" } else { "off" }
        )?;
        for (frame, issues) in self.by_frame() {
            writeln!(f, "frame {frame}:")?;
            for issue in issues {
                writeln!(
                    f,
                    "  [{}] {} ({}): {}",
                    issue.severity(),
                    issue.object_token,
                    issue.class_name,
                    issue.kind
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::catalog::Frame;
    use crate::issue::IssueKind;
    use crate::regime::MotionRegime;
    use annotation_types::AnnotatedObject;

    fn catalog() -> SequenceCatalog {
        let car = |t: &str| AnnotatedObject::new(t, "vehicle.car", [0.0; 3]);
        SequenceCatalog::new(vec![
            Frame::new("0", vec![car("a"), car("b")]),
            Frame::new("1", vec![car("c")]),
            Frame::new("2", vec![]),
            Frame::new("3", vec![car("d")]),
        ])
    }

    fn issue(frame: &str, token: &str, kind: IssueKind) -> Issue {
        Issue::new(&FrameId::new(frame), &AnnotatedObject::new(token, "vehicle.car", [0.0; 3]), kind)
    }

    fn sample_report() -> AuditReport {
        let issues = vec![
            issue("0", "a", IssueKind::LowPointCount { count: 1, min: 5 }),
            issue("0", "a", IssueKind::ExcessiveRoll { roll: 0.7 }),
            issue("1", "c", IssueKind::ReverseMotion {
                delta: 3.1,
                speed: 2.0,
                regime: MotionRegime::NormalSpeed,
            }),
            issue("3", "d", IssueKind::TrajectoryDiscontinuity { speed: 12.0 }),
        ];
        let summary = AuditSummary::compute(&catalog(), &issues, 2, 1, true);
        AuditReport::new(issues, summary)
    }

    #[test]
    fn summary_counts_warnings_only() {
        let report = sample_report();
        let s = report.summary();
        assert_eq!(s.total_frames, 4);
        assert_eq!(s.total_objects, 4);
        assert_eq!(s.issue_frames, 2);
        assert_eq!(s.issue_objects, 2);
        assert_eq!(s.warnings, 3);
        assert_eq!(s.infos, 1);
        assert_eq!(s.pass_rate, 50.0);
        assert!(!report.is_clean());
    }

    #[test]
    fn empty_catalog_has_zero_pass_rate() {
        let summary = AuditSummary::compute(&SequenceCatalog::default(), &[], 0, 0, false);
        assert_eq!(summary.pass_rate, 0.0);
        assert!(AuditReport::new(Vec::new(), summary).is_clean());
    }

    #[test]
    fn lookup_and_grouping() {
        let report = sample_report();
        assert_eq!(report.issues_for(&FrameId::new("0"), "a").count(), 2);
        assert_eq!(report.issues_for(&FrameId::new("0"), "b").count(), 0);

        let groups = report.by_frame();
        let frames: Vec<&str> = groups.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(frames, vec!["0", "1", "3"]);
        assert_eq!(groups[0].1.len(), 2);

        assert_eq!(report.with_severity(IssueSeverity::Info).count(), 1);
        assert_eq!(report.count_by_kind()["low_point_count"], 1);
    }

    #[test]
    fn renders_text_and_json() {
        let report = sample_report();
        let text = report.to_string();
        assert!(text.contains("pass rate 50.0%"));
        assert!(text.contains("pose compensation: on"));
        assert!(text.contains("frame 3:"));
        assert!(text.contains("[info] c (vehicle.car)"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["issue_frames"], 2);
        assert_eq!(json["issues"].as_array().unwrap().len(), 4);
        assert_eq!(json["issues"][3]["type"], "trajectory_discontinuity");
    }
}
