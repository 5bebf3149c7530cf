//! Agent Core: orchestration layer of the notes assistant.
//!
//! Submodules:
//! - `conversation`: the bounded tool-calling loop
//! - `transcript`: chat history to backend-neutral transcript
//! - `tool_router`: executes tool calls against the registry, in order
//! - `side_effects`: tracks notes created during a conversation
//! - `progress`: fire-and-forget progress notifications
//! - `types`: shared types across the agent core
//! - `errors`: caller-facing error type

pub mod conversation;
pub mod errors;
pub mod progress;
pub mod side_effects;
pub mod tool_router;
pub mod transcript;
pub mod types;

// Re-exports for convenience
pub use conversation::{
    ConversationLoop, LoopInput, LoopSettings, MAX_TOOL_ROUNDS, ROUNDS_EXHAUSTED_TEXT,
};
pub use errors::ChatError;
pub use progress::{progress_sink, silent_sink, ProgressSink};
pub use side_effects::SideEffectTracker;
pub use tool_router::ToolRouter;
pub use transcript::build_transcript;
pub use types::{ChatMessage, ChatResult, ChatRole, LoopState, ToolOutput};
