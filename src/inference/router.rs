//! Model router: picks exactly one backend for a model identifier.
//!
//! Routing is a pure function of the identifier and the runtime capability
//! set. Key checks happen here too, so a missing key fails before any
//! network call is attempted. There is no fallback between backends.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::{is_anthropic_model, is_openai_model};
use super::errors::InferenceError;

/// The backend transports the router can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Anthropic,
    OpenAi,
    /// Catch-all multiplexed backend for `vendor/model` identifiers.
    OpenRouter,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Anthropic => "Anthropic",
            BackendKind::OpenAi => "OpenAI",
            BackendKind::OpenRouter => "OpenRouter",
        };
        f.write_str(name)
    }
}

/// Backends enabled for this process, resolved once from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub anthropic_enabled: bool,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self {
            anthropic_enabled: true,
        }
    }
}

/// Per-call API key bundle. An empty string means "not configured".
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub anthropic: String,
    pub openai: String,
    pub openrouter: String,
}

impl ApiKeys {
    /// The key associated with a backend.
    pub fn for_backend(&self, kind: BackendKind) -> &str {
        match kind {
            BackendKind::Anthropic => &self.anthropic,
            BackendKind::OpenAi => &self.openai,
            BackendKind::OpenRouter => &self.openrouter,
        }
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &str| if k.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("ApiKeys")
            .field("anthropic", &mask(&self.anthropic))
            .field("openai", &mask(&self.openai))
            .field("openrouter", &mask(&self.openrouter))
            .finish()
    }
}

/// Route a model identifier to a backend.
///
/// Priority: Anthropic (when enabled), then OpenAI, then OpenRouter.
pub fn route(model: &str, capabilities: &BackendCapabilities) -> BackendKind {
    if capabilities.anthropic_enabled && is_anthropic_model(model) {
        BackendKind::Anthropic
    } else if is_openai_model(model) {
        BackendKind::OpenAi
    } else {
        BackendKind::OpenRouter
    }
}

/// Route a model identifier and require the routed backend's key.
pub fn select_backend(
    model: &str,
    capabilities: &BackendCapabilities,
    keys: &ApiKeys,
) -> Result<BackendKind, InferenceError> {
    let backend = route(model, capabilities);
    if keys.for_backend(backend).trim().is_empty() {
        tracing::warn!(model = %model, backend = %backend, "no API key for routed backend");
        return Err(InferenceError::NoApiKey { backend });
    }
    Ok(backend)
}
