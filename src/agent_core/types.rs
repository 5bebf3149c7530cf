//! Shared types across the agent core.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Chat history ───────────────────────────────────────────────────────────

/// Role of a persisted chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    Tool,
}

/// A message of the caller's chat history. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

// ─── Tool execution ─────────────────────────────────────────────────────────

/// Result of one tool call, positionally matched to the call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub call_id: String,
    pub tool_name: String,
    /// Text fed back to the model. Error outputs carry `{"error": "..."}`.
    pub content: String,
    pub is_error: bool,
    /// Note created by this call, when the tool reported one.
    pub created: Option<PathBuf>,
}

// ─── Results ────────────────────────────────────────────────────────────────

/// Terminal output of a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatResult {
    pub text: String,
    /// Notes created during the conversation, in creation order.
    pub created: Vec<PathBuf>,
}

/// States of the conversation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingModel,
    ExecutingTools,
    Done,
    RoundsExhausted,
}
