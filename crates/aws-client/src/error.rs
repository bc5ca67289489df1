//! AWS client errors

use thiserror::Error;

/// Errors that can occur when interacting with the AWS APIs
#[derive(Debug, Error)]
pub enum AwsError {
    /// AWS returned a structured error code
    #[error("AWS API error [{code}]: {message}")]
    Api {
        /// Provider error code, e.g. `DuplicateLoadBalancerName`
        code: String,
        /// Free-text message attached to the error
        message: String,
    },

    /// Transport-level failure (connection, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AwsError {
    /// Build a structured API error
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The provider error code, when one was returned
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
