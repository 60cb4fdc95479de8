//! Error types for annotation-audit crate.

use annotation_fusion::FusionError;
use thiserror::Error;

/// Errors that stop an audit run before it starts.
///
/// Annotation problems are never errors; they are reported as
/// [`Issue`](crate::Issue) values. These variants cover configuration and
/// input that make the run itself meaningless.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A rule value is missing, out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The rule file could not be read.
    #[error("failed to read rule file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The rule file could not be parsed.
    #[error("failed to parse rules: {0}")]
    Parse(String),

    /// Pose fusion rejected its input or configuration.
    #[error(transparent)]
    Fusion(#[from] FusionError),
}

impl AuditError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse(reason.into())
    }
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = AuditError::invalid_config("size_rules must not be empty");
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("size_rules"));
    }

    #[test]
    fn error_from_fusion() {
        let err: AuditError = FusionError::invalid_config("tolerance").into();
        assert!(matches!(err, AuditError::Fusion(_)));
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn error_io_names_path() {
        let err = AuditError::Io {
            path: "rules.yaml".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("rules.yaml"));
    }
}
