//! Error types for the HTTP providers

use pipewatch_core::ProviderError;
use thiserror::Error;

/// Longest response body kept in an error message.
const MAX_BODY_CHARS: usize = 512;

/// Errors that can occur while talking to a status endpoint
#[derive(Error, Debug)]
pub enum HttpError {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected JSON shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Endpoint URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl HttpError {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        let body = if body.chars().count() > MAX_BODY_CHARS {
            let cut: String = body.chars().take(MAX_BODY_CHARS).collect();
            format!("{}...", cut)
        } else {
            body.to_string()
        };
        HttpError::Status { status, body }
    }
}

impl From<HttpError> for ProviderError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Http(e) if e.is_decode() => ProviderError::Malformed(e.to_string()),
            HttpError::Http(e) => ProviderError::Unreachable(e.to_string()),
            HttpError::Status { status, body } => ProviderError::Status { status, body },
            HttpError::Decode(msg) => ProviderError::Malformed(msg),
            HttpError::InvalidUrl(url) => ProviderError::Unreachable(format!("invalid URL: {}", url)),
        }
    }
}

/// Result type for HTTP provider operations
pub type Result<T> = std::result::Result<T, HttpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_body_is_truncated() {
        let long = "x".repeat(2_000);
        let HttpError::Status { body, .. } = HttpError::status(502, &long) else {
            panic!("expected status error");
        };
        assert_eq!(body.len(), MAX_BODY_CHARS + 3);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_maps_into_provider_error() {
        let err: ProviderError = HttpError::status(404, "not found").into();
        assert_eq!(
            err,
            ProviderError::Status {
                status: 404,
                body: "not found".to_string()
            }
        );

        let err: ProviderError = HttpError::Decode("missing field `runs`".to_string()).into();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }
}
