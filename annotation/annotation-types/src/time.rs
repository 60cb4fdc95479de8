//! Time types for annotations and poses.
//!
//! Pose logs are stamped in nanoseconds; interpolation tolerances are on the
//! order of 100 ms, so all arithmetic stays in integer nanoseconds until a
//! ratio or a velocity is needed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nanosecond-precision timestamp.
///
/// # Example
///
/// ```
/// use annotation_types::Timestamp;
///
/// let ts = Timestamp::from_millis(1_500);
/// assert_eq!(ts.as_nanos(), 1_500_000_000);
/// assert!((ts.as_secs_f64() - 1.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp {
    nanos: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Creates a timestamp from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis * 1_000_000,
        }
    }

    /// Creates a timestamp from seconds (floating point).
    ///
    /// Negative inputs clamp to zero.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_secs_f64(secs: f64) -> Self {
        let nanos = (secs * 1e9).round().max(0.0) as u64;
        Self { nanos }
    }

    /// Returns the timestamp as nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos
    }

    /// Returns the timestamp as seconds (floating point).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.nanos as f64 / 1e9
    }

    /// Returns the absolute duration between two timestamps.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> Duration {
        Duration::from_nanos(self.nanos.abs_diff(other.nanos))
    }

    /// Returns `self - other` in seconds, negative when `self` is earlier.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds_since(self, other: Self) -> f64 {
        if self.nanos >= other.nanos {
            (self.nanos - other.nanos) as f64 / 1e9
        } else {
            -((other.nanos - self.nanos) as f64 / 1e9)
        }
    }
}

/// A non-negative span of time with nanosecond precision.
///
/// # Example
///
/// ```
/// use annotation_types::Duration;
///
/// let d = Duration::from_millis(100);
/// assert_eq!(d.as_nanos(), 100_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Duration {
    nanos: u64,
}

impl Duration {
    /// Creates a duration from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Creates a duration from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis * 1_000_000,
        }
    }

    /// Creates a duration from seconds (floating point).
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_secs_f64(secs: f64) -> Self {
        let nanos = (secs * 1e9).round().max(0.0) as u64;
        Self { nanos }
    }

    /// Returns the duration as nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos
    }

    /// Returns the duration as milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Returns the duration as seconds (floating point).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.nanos as f64 / 1e9
    }

    /// Checks if this is a zero duration.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.nanos == 0
    }
}

/// A closed time range `[start, end]`.
///
/// Used to report the coverage of a pose log.
///
/// # Example
///
/// ```
/// use annotation_types::{TimeRange, Timestamp};
///
/// let range = TimeRange::new(Timestamp::from_millis(0), Timestamp::from_millis(200));
/// assert!(range.contains(Timestamp::from_millis(200)));
/// assert_eq!(range.duration().as_millis(), 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeRange {
    /// Earliest timestamp (inclusive).
    pub start: Timestamp,
    /// Latest timestamp (inclusive).
    pub end: Timestamp,
}

impl TimeRange {
    /// Creates a new time range, swapping the bounds if needed.
    #[must_use]
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Returns the span of this range.
    #[must_use]
    pub const fn duration(self) -> Duration {
        self.start.abs_diff(self.end)
    }

    /// Checks if a timestamp lies within the range (both ends inclusive).
    #[must_use]
    pub fn contains(self, timestamp: Timestamp) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}
