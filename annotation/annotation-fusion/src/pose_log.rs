//! Time-ordered log of ego poses.

use annotation_types::{EgoPose, TimeRange, Timestamp};
use tracing::warn;

use crate::error::{FusionError, Result};

/// A time-ordered, de-duplicated log of ego poses.
///
/// Navigation logs are sparse and not guaranteed to arrive sorted. The log
/// sorts entries once on construction (stable, so equal timestamps keep their
/// input order) and keeps the first entry of each timestamp.
///
/// # Example
///
/// ```
/// use annotation_fusion::PoseLog;
/// use annotation_types::{EgoPose, Timestamp};
///
/// let log = PoseLog::new(vec![
///     EgoPose::from_translation(Timestamp::from_millis(200), [2.0, 0.0, 0.0]),
///     EgoPose::from_translation(Timestamp::from_millis(0), [0.0, 0.0, 0.0]),
///     EgoPose::from_translation(Timestamp::from_millis(100), [1.0, 0.0, 0.0]),
/// ])
/// .unwrap();
///
/// assert_eq!(log.len(), 3);
/// assert_eq!(log.get(0).unwrap().timestamp, Timestamp::from_millis(0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PoseLog {
    poses: Vec<EgoPose>,
}

/// Indices of the log entries surrounding a timestamp.
///
/// `before` is the last entry at or before the target, `after` the first
/// entry at or after it. Both are equal on an exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    /// Index of the last entry with `timestamp <= target`.
    pub before: Option<usize>,
    /// Index of the first entry with `timestamp >= target`.
    pub after: Option<usize>,
}

impl PoseLog {
    /// Builds a log from poses in any order.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidPose`] if any entry has a non-finite
    /// position, orientation or azimuth component.
    pub fn new(poses: impl IntoIterator<Item = EgoPose>) -> Result<Self> {
        let mut poses: Vec<EgoPose> = poses.into_iter().collect();

        if let Some(bad) = poses.iter().find(|p| !p.is_finite()) {
            return Err(FusionError::invalid_pose(
                bad.timestamp.as_nanos(),
                "non-finite component",
            ));
        }

        poses.sort_by_key(|p| p.timestamp);

        let before = poses.len();
        poses.dedup_by_key(|p| p.timestamp);
        if poses.len() < before {
            warn!(
                dropped = before - poses.len(),
                "Pose log contains duplicate timestamps, keeping first entry of each"
            );
        }

        Ok(Self { poses })
    }

    /// Returns the number of poses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Gets a pose by its position in timestamp order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EgoPose> {
        self.poses.get(index)
    }

    /// Returns an iterator over poses in timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = &EgoPose> {
        self.poses.iter()
    }

    /// Returns the covered time range, or `None` for an empty log.
    #[must_use]
    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.poses.first()?;
        let last = self.poses.last()?;
        Some(TimeRange::new(first.timestamp, last.timestamp))
    }

    /// Returns the pose stamped exactly at `timestamp`.
    #[must_use]
    pub fn exact(&self, timestamp: Timestamp) -> Option<&EgoPose> {
        self.poses
            .binary_search_by_key(&timestamp, |p| p.timestamp)
            .ok()
            .and_then(|idx| self.poses.get(idx))
    }

    /// Finds the entries bracketing `timestamp`.
    #[must_use]
    pub fn find_bracket(&self, timestamp: Timestamp) -> Bracket {
        // First entry with timestamp >= target
        let lo = self.poses.partition_point(|p| p.timestamp < timestamp);

        let after = (lo < self.poses.len()).then_some(lo);
        let before = match after {
            Some(idx) if self.poses[idx].timestamp == timestamp => Some(idx),
            _ => lo.checked_sub(1),
        };

        Bracket { before, after }
    }

    /// Returns the entry closest in time to `timestamp`.
    ///
    /// Ties go to the earlier entry.
    #[must_use]
    pub fn nearest(&self, timestamp: Timestamp) -> Option<&EgoPose> {
        let Bracket { before, after } = self.find_bracket(timestamp);
        match (before.and_then(|i| self.poses.get(i)), after.and_then(|i| self.poses.get(i))) {
            (Some(b), Some(a)) => {
                if timestamp.abs_diff(b.timestamp) <= timestamp.abs_diff(a.timestamp) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }
}
