//! Assistant configuration loading.
//!
//! Reads `notechat.yaml` and resolves environment variables. API keys are
//! deliberately absent: they arrive with every chat request.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::errors::InferenceError;
use super::router::BackendCapabilities;

/// Config file name searched for by [`find_config_path`].
pub const CONFIG_FILE_NAME: &str = "notechat.yaml";

// ─── Public Types ────────────────────────────────────────────────────────────

/// Runtime configuration for provider clients and the conversation loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Whether Anthropic models are served by the direct Anthropic backend.
    /// When `false`, Claude identifiers fall through to OpenRouter.
    pub anthropic_enabled: bool,
    pub anthropic_base_url: String,
    pub openai_base_url: String,
    pub openrouter_base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Total HTTP request timeout.
    pub request_timeout_secs: u64,
    /// Optional wall-clock cap for a single model call.
    pub round_timeout_secs: Option<u64>,
    /// Sent to OpenRouter as `X-Title`.
    pub app_name: String,
    /// Sent to OpenRouter as `HTTP-Referer`.
    pub app_url: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            anthropic_enabled: true,
            anthropic_base_url: "https://api.anthropic.com/v1".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openrouter_base_url: "https://openrouter.ai/api/v1".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            request_timeout_secs: 120,
            round_timeout_secs: None,
            app_name: "Notechat".to_string(),
            app_url: "https://github.com/notechat/notechat".to_string(),
        }
    }
}

impl AssistantConfig {
    pub fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            anthropic_enabled: self.anthropic_enabled,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn round_timeout(&self) -> Option<Duration> {
        self.round_timeout_secs.map(Duration::from_secs)
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// Checks `NOTECHAT_CONFIG` first, then searches upward from `start` for
/// `notechat.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, InferenceError> {
    if let Ok(path) = std::env::var("NOTECHAT_CONFIG") {
        let candidate = PathBuf::from(expand_tilde(&path));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(InferenceError::ConfigError {
        reason: format!("could not find {CONFIG_FILE_NAME}"),
    })
}

/// Load and parse the config file.
///
/// Performs environment-variable interpolation on string values matching
/// `${VAR_NAME}` or `${VAR_NAME:-default}`.
pub fn load_config(path: &Path) -> Result<AssistantConfig, InferenceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| InferenceError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_config(&raw)
}

/// Parse config YAML text (after env interpolation).
pub fn parse_config(raw: &str) -> Result<AssistantConfig, InferenceError> {
    let interpolated = interpolate_env_vars(raw);
    if interpolated.trim().is_empty() {
        return Ok(AssistantConfig::default());
    }

    let config: AssistantConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| InferenceError::ConfigError {
            reason: format!("failed to parse config: {e}"),
        })?;

    if config.max_tokens == 0 {
        return Err(InferenceError::ConfigError {
            reason: "max_tokens must be greater than zero".into(),
        });
    }

    Ok(config)
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
pub(crate) fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
