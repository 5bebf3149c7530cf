//! Agent Core error types.

use thiserror::Error;

use crate::inference::{BackendKind, InferenceError};

/// Terminal failures of a conversation, as surfaced to the caller.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The backend serving the model has no API key. Raised before any
    /// network call.
    #[error("no API key configured for {backend}")]
    NoApiKey { backend: BackendKind },

    /// The model returned neither text nor tool calls.
    #[error("the model returned an empty response")]
    EmptyResponse,

    /// The backend answered with a non-success status.
    #[error("API error from '{model}' (HTTP {status}): {detail}")]
    ApiError {
        model: String,
        status: u16,
        detail: String,
    },

    /// Transport, decoding or configuration failure.
    #[error("provider error: {0}")]
    ProviderError(String),
}

impl ChatError {
    /// Wrap an inference failure with the model it happened on.
    pub fn from_inference(model: &str, err: InferenceError) -> Self {
        match err {
            InferenceError::NoApiKey { backend } => ChatError::NoApiKey { backend },
            InferenceError::HttpError { status, body } => ChatError::ApiError {
                model: model.to_string(),
                status,
                detail: body,
            },
            other => ChatError::ProviderError(other.to_string()),
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::NoApiKey { backend } => {
                format!("Add your {backend} API key in settings to use this model.")
            }
            ChatError::EmptyResponse => {
                "The model returned an empty response. Please try again.".to_string()
            }
            ChatError::ApiError { model, status, .. } => match status {
                401 | 403 => format!("The API key was rejected for {model}."),
                404 => format!("The model {model} is not available."),
                429 => "Rate limit reached. Please wait a moment and try again.".to_string(),
                500..=599 => format!("{model} is temporarily unavailable (HTTP {status})."),
                _ => format!("Request to {model} failed (HTTP {status})."),
            },
            ChatError::ProviderError(_) => {
                "Could not reach the model provider. Check your connection.".to_string()
            }
        }
    }
}
