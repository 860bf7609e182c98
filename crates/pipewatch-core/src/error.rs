//! Error taxonomy for pipewatch.
//!
//! Only caller input errors are fatal to a monitoring session. Provider
//! errors are absorbed by the poller and surface in the report instead.

use thiserror::Error;

/// Errors raised by a status provider for a single query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Network failure or timeout before a response arrived.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// The provider answered with a non-success status code.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The provider cannot address the given pipeline subject.
    #[error("invalid pipeline identity: {0}")]
    InvalidIdentity(String),
}

/// Errors returned by [`crate::PipelineMonitor::monitor`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// A parameter failed validation; the session never started.
    #[error("invalid monitor input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

/// Errors produced by the tool dispatcher.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("invalid params for `{method}`: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for provider queries.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result type for monitoring sessions.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_status_error_display() {
        let err = ProviderError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }

    #[test]
    fn test_invalid_input_names_field() {
        let err = MonitorError::InvalidInput {
            field: "poll_interval",
            reason: "must be greater than zero".to_string(),
        };
        assert!(err.to_string().contains("poll_interval"));
    }

    #[test]
    fn test_tool_error_wraps_provider_error() {
        let err: ToolError = ProviderError::Unreachable("connection refused".to_string()).into();
        assert!(matches!(err, ToolError::Provider(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
