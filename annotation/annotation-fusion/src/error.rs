//! Error types for annotation-fusion crate.

use thiserror::Error;

/// Errors that can occur while building or configuring pose resolution.
///
/// A pose that simply cannot be resolved for a timestamp is *not* an error;
/// resolution returns `None` in that case.
#[derive(Debug, Error)]
pub enum FusionError {
    /// A pose log entry contains a non-finite component.
    #[error("invalid pose at {timestamp_ns} ns: {reason}")]
    InvalidPose {
        /// Timestamp of the offending entry.
        timestamp_ns: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FusionError {
    /// Creates an invalid pose error.
    #[must_use]
    pub fn invalid_pose(timestamp_ns: u64, reason: impl Into<String>) -> Self {
        Self::InvalidPose {
            timestamp_ns,
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for pose fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_pose() {
        let err = FusionError::invalid_pose(42, "non-finite position");
        assert!(err.to_string().contains("invalid pose"));
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("non-finite position"));
    }

    #[test]
    fn error_invalid_config() {
        let err = FusionError::invalid_config("tolerance must be positive");
        assert!(err.to_string().contains("invalid configuration"));
    }
}
