//! Notechat: AI chat orchestration over a markdown notes vault.
//!
//! Modules:
//! - `chat`: the per-message entry point ([`NoteAssistant`])
//! - `agent_core`: conversation loop, tool execution, progress, side effects
//! - `inference`: model routing and provider clients
//! - `tools`: the note tools and their storage contract
//! - `prompt`: system prompt construction
//! - `logging`: log file setup

pub mod agent_core;
pub mod chat;
pub mod inference;
pub mod logging;
pub mod prompt;
pub mod tools;

pub use agent_core::{
    progress_sink, silent_sink, ChatError, ChatMessage, ChatResult, ChatRole, ProgressSink,
};
pub use chat::{ChatRequest, NoteAssistant};
pub use inference::{ApiKeys, AssistantConfig, BackendKind};
pub use prompt::{DefaultPromptBuilder, PromptInputs, SystemPromptBuilder};
pub use tools::{FsNoteStore, NoteMeta, NoteStore, ToolContext};
