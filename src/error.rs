//! Error types for the change-set deployment workflow.
//!
//! Configuration problems and control-plane failures each get their own
//! enum; [`ChangeSetsError`] wraps them for propagation with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the change-set workflow.
#[derive(Debug, Error)]
pub enum ChangeSetsError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure reported by the control-plane.
    ///
    /// Rendered verbatim so the operator sees the control-plane's own diagnostic.
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// A failure returned by the control-plane API.
///
/// `code` is the structured error code when the transport exposes one;
/// `message` is the human-readable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ControlPlaneError {
    /// Structured error code, if any.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// Result type alias for change-set operations.
pub type Result<T> = std::result::Result<T, ChangeSetsError>;

impl ChangeSetsError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the control-plane failure wrapped by this error, if any.
    #[must_use]
    pub const fn as_control_plane(&self) -> Option<&ControlPlaneError> {
        match self {
            Self::ControlPlane(err) => Some(err),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl ControlPlaneError {
    /// Creates a failure with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Creates a failure with a structured code.
    #[must_use]
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_plane_error_displays_message_verbatim() {
        let err: ChangeSetsError =
            ControlPlaneError::with_code("AccessDenied", "User is not authorized").into();
        assert_eq!(err.to_string(), "User is not authorized");
        assert_eq!(
            err.as_control_plane().and_then(|e| e.code.as_deref()),
            Some("AccessDenied")
        );
    }

    #[test]
    fn test_config_error_is_not_control_plane() {
        let err: ChangeSetsError = ConfigError::validation_general("bad").into();
        assert!(err.as_control_plane().is_none());
    }
}
