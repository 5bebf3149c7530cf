//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility. These types carry the context needed to build
//! meaningful log entries.

use thiserror::Error;

use super::router::BackendKind;

/// Errors that can occur while routing or talking to a model backend.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The backend selected for the model has no API key configured.
    #[error("no API key configured for {backend}")]
    NoApiKey { backend: BackendKind },

    /// TCP/HTTP connection to the model endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The model endpoint did not respond within the configured timeout.
    #[error("inference timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Failed to parse a tool call from the model's response.
    #[error("tool call parse error: {reason}")]
    ToolCallParseError { raw_response: String, reason: String },

    /// Non-2xx HTTP response from the model endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("response error: {reason}")]
    ResponseError { reason: String },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

impl InferenceError {
    /// Map a `reqwest` send failure onto a connection or timeout error.
    pub(crate) fn from_send(endpoint: &str, err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            InferenceError::Timeout {
                duration_secs: timeout_secs,
            }
        } else {
            InferenceError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_api_key_display_names_backend() {
        let err = InferenceError::NoApiKey {
            backend: BackendKind::OpenRouter,
        };
        assert_eq!(err.to_string(), "no API key configured for OpenRouter");
    }
}
