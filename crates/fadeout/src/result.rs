//! Result and error types for fadeout.

use thiserror::Error;

/// Result type for fade operations
pub type FadeResult<T> = Result<T, FadeError>;

/// Errors that can occur while setting up or running a fade
#[derive(Debug, Error)]
pub enum FadeError {
    /// The element identifier did not resolve to an element
    #[error("Target element not found: #{id}")]
    TargetNotFound {
        /// Identifier that failed to resolve
        id: String,
    },

    /// Timing configuration rejected by validation
    #[error("Invalid fade configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// The host environment refused an operation (window, timers, style writes)
    #[error("Host error: {message}")]
    Host {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FadeError {
    /// Shorthand for [`FadeError::TargetNotFound`]
    pub fn target_not_found(id: impl Into<String>) -> Self {
        Self::TargetNotFound { id: id.into() }
    }

    /// Shorthand for [`FadeError::InvalidConfig`]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Shorthand for [`FadeError::Host`]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }
}
