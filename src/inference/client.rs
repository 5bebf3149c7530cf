//! Provider client abstraction.
//!
//! A [`ChatProvider`] is the only network boundary of the engine. The
//! conversation loop asks a [`ProviderResolver`] for the client serving the
//! routed backend, so tests can swap in scripted providers without touching
//! the routing rules.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::anthropic::AnthropicClient;
use super::config::AssistantConfig;
use super::errors::InferenceError;
use super::openai::OpenAiCompatClient;
use super::router::{ApiKeys, BackendKind};
use super::types::{GenerationConfig, GenerationResult, WireMessage};

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One backend transport able to run a generation round.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one generation round. Errors are not retried.
    async fn generate(
        &self,
        transcript: &[WireMessage],
        model: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult, InferenceError>;
}

/// Supplies the client for a routed backend.
pub trait ProviderResolver: Send + Sync {
    fn client_for(
        &self,
        backend: BackendKind,
        keys: &ApiKeys,
    ) -> Result<Arc<dyn ChatProvider>, InferenceError>;
}

// ─── HttpProviderResolver ────────────────────────────────────────────────────

/// Live resolver building reqwest-backed clients from config.
///
/// A fresh client is built per call: keys are per-invocation inputs and are
/// never cached across conversations.
pub struct HttpProviderResolver {
    config: AssistantConfig,
    http: HttpClient,
}

impl HttpProviderResolver {
    pub fn new(config: AssistantConfig) -> Result<Self, InferenceError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InferenceError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }
}

impl ProviderResolver for HttpProviderResolver {
    fn client_for(
        &self,
        backend: BackendKind,
        keys: &ApiKeys,
    ) -> Result<Arc<dyn ChatProvider>, InferenceError> {
        let key = keys.for_backend(backend);
        if key.trim().is_empty() {
            return Err(InferenceError::NoApiKey { backend });
        }
        let timeout_secs = self.config.request_timeout_secs;

        let client: Arc<dyn ChatProvider> = match backend {
            BackendKind::Anthropic => Arc::new(AnthropicClient::new(
                self.http.clone(),
                &self.config.anthropic_base_url,
                key,
                timeout_secs,
            )),
            BackendKind::OpenAi => Arc::new(OpenAiCompatClient::openai(
                self.http.clone(),
                &self.config.openai_base_url,
                key,
                timeout_secs,
            )),
            BackendKind::OpenRouter => Arc::new(OpenAiCompatClient::openrouter(
                self.http.clone(),
                &self.config.openrouter_base_url,
                key,
                timeout_secs,
                &self.config.app_name,
                &self.config.app_url,
            )),
        };
        Ok(client)
    }
}

/// Read a response body, turning non-2xx statuses into `HttpError`.
pub(crate) async fn read_success_body(response: reqwest::Response) -> Result<String, InferenceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(InferenceError::HttpError {
            status: status.as_u16(),
            body,
        });
    }
    response.text().await.map_err(|e| InferenceError::ResponseError {
        reason: format!("failed to read response body: {e}"),
    })
}
