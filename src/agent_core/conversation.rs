//! ConversationLoop: the bounded, multi-round tool-calling exchange.
//!
//! One loop instance serves one invocation. Each round asks the model for a
//! response; when it requests tools, the calls are executed in order, their
//! outputs are appended to the transcript and the model is asked again. The
//! loop ends with the model's final text, an error, or, when the round
//! budget runs out, a fixed completion text carrying every side effect
//! performed so far.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::inference::{
    select_backend, ApiKeys, AssistantConfig, BackendCapabilities, ChatProvider, GenerationConfig,
    GenerationResult, ProviderResolver, WireMessage,
};
use crate::tools::{NoteStore, ToolRegistry};

use super::errors::ChatError;
use super::progress::{self, ProgressSink};
use super::side_effects::SideEffectTracker;
use super::tool_router::ToolRouter;
use super::types::{ChatResult, LoopState};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Maximum number of model calls per invocation.
///
/// Each round allows one model response plus one batch of tool executions.
pub const MAX_TOOL_ROUNDS: usize = 10;

/// Completion text returned when the model was still requesting tools after
/// the last round.
pub const ROUNDS_EXHAUSTED_TEXT: &str =
    "I've made several changes to your notes but ran out of steps before finishing. \
     Ask me to continue if there is more to do.";

// ─── Settings ───────────────────────────────────────────────────────────────

/// Generation and safety settings of the loop.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub capabilities: BackendCapabilities,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Optional wall-clock cap on a single model call.
    pub round_timeout: Option<Duration>,
}

impl LoopSettings {
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            capabilities: config.capabilities(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            round_timeout: config.round_timeout(),
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&AssistantConfig::default())
    }
}

/// Per-invocation inputs of the loop.
pub struct LoopInput<'a> {
    pub model: &'a str,
    pub keys: &'a ApiKeys,
    /// Initial transcript: system entry plus history.
    pub transcript: Vec<WireMessage>,
    /// Shown in the start notification.
    pub note_count: usize,
    /// Shown in the start notification.
    pub message_count: usize,
    pub progress: ProgressSink,
}

// ─── ConversationLoop ───────────────────────────────────────────────────────

pub struct ConversationLoop {
    resolver: Arc<dyn ProviderResolver>,
    registry: ToolRegistry,
    store: Arc<dyn NoteStore>,
    /// Directory scanned when a created note must be located by listing.
    notes_dir: PathBuf,
    settings: LoopSettings,
}

impl ConversationLoop {
    pub fn new(
        resolver: Arc<dyn ProviderResolver>,
        registry: ToolRegistry,
        store: Arc<dyn NoteStore>,
        notes_dir: PathBuf,
        settings: LoopSettings,
    ) -> Self {
        Self {
            resolver,
            registry,
            store,
            notes_dir,
            settings,
        }
    }

    /// Drive the conversation to a final answer.
    pub async fn run(&self, input: LoopInput<'_>) -> Result<ChatResult, ChatError> {
        let LoopInput {
            model,
            keys,
            mut transcript,
            note_count,
            message_count,
            progress,
        } = input;

        // Routing and key checks happen before any network access.
        let backend = select_backend(model, &self.settings.capabilities, keys)
            .map_err(|e| ChatError::from_inference(model, e))?;
        let provider = self
            .resolver
            .client_for(backend, keys)
            .map_err(|e| ChatError::from_inference(model, e))?;

        let config = GenerationConfig {
            tools: self.registry.definitions(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        tracing::info!(
            model = %model,
            backend = %backend,
            message_count,
            note_count,
            tool_count = config.tools.len(),
            "starting conversation"
        );
        progress::notify(
            &progress,
            progress::start_message(model, note_count, message_count),
        );

        let router = ToolRouter::new(&self.registry);
        let mut tracker = SideEffectTracker::new();
        let mut state = LoopState::AwaitingModel;

        for round in 0..MAX_TOOL_ROUNDS {
            let result = self
                .generate_round(provider.as_ref(), &transcript, model, &config, round)
                .await?;

            if !result.has_tool_calls() {
                let text = result.text.trim();
                if text.is_empty() {
                    tracing::warn!(round, model = %model, "model returned neither text nor tool calls");
                    return Err(ChatError::EmptyResponse);
                }

                transition(state, LoopState::Done, round);
                tracing::info!(
                    round,
                    text_len = text.len(),
                    created = tracker.created().len(),
                    "conversation finished"
                );
                return Ok(ChatResult {
                    text: text.to_string(),
                    created: tracker.into_created(),
                });
            }

            state = transition(state, LoopState::ExecutingTools, round);
            let GenerationResult { text, tool_calls } = result;
            tracing::info!(
                round,
                tool_calls = tool_calls.len(),
                tools = ?tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "executing tool calls"
            );

            let outputs = router.dispatch_tool_calls(&tool_calls).await;

            transcript.push(WireMessage::Assistant {
                text,
                tool_calls: tool_calls.clone(),
            });
            for (call, output) in tool_calls.iter().zip(&outputs) {
                transcript.push(WireMessage::ToolOutput {
                    call_id: output.call_id.clone(),
                    tool_name: output.tool_name.clone(),
                    content: output.content.clone(),
                });
                progress::notify(&progress, progress::describe_tool_call(call));
                tracker
                    .record(output, self.store.as_ref(), &self.notes_dir)
                    .await;
            }

            state = transition(state, LoopState::AwaitingModel, round);
        }

        transition(state, LoopState::RoundsExhausted, MAX_TOOL_ROUNDS);
        tracing::warn!(
            model = %model,
            rounds = MAX_TOOL_ROUNDS,
            created = tracker.created().len(),
            "round budget exhausted, returning completion text"
        );
        Ok(ChatResult {
            text: ROUNDS_EXHAUSTED_TEXT.to_string(),
            created: tracker.into_created(),
        })
    }

    /// One model call, bounded by the optional round timeout.
    async fn generate_round(
        &self,
        provider: &dyn ChatProvider,
        transcript: &[WireMessage],
        model: &str,
        config: &GenerationConfig,
        round: usize,
    ) -> Result<GenerationResult, ChatError> {
        let start = Instant::now();
        let call = provider.generate(transcript, model, config);

        let result = match self.settings.round_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(round, model = %model, limit_ms = limit.as_millis() as u64, "model call timed out");
                    return Err(ChatError::ProviderError(format!(
                        "model call timed out after {}s",
                        limit.as_secs_f64()
                    )));
                }
            },
            None => call.await,
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(result) => {
                tracing::debug!(
                    round,
                    elapsed_ms,
                    text_len = result.text.len(),
                    tool_calls = result.tool_calls.len(),
                    "model round complete"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(round, elapsed_ms, model = %model, error = %e, "model call failed");
                Err(ChatError::from_inference(model, e))
            }
        }
    }
}

fn transition(from: LoopState, to: LoopState, round: usize) -> LoopState {
    tracing::debug!(round, from = ?from, to = ?to, "loop state");
    to
}

// ─── Tests ──────────────────────────────────────────────────────────────────
