//! Inference: model routing and provider clients.
//!
//! This module handles all communication with model backends:
//! - Static model catalog and deterministic routing (`catalog`, `router`)
//! - Backend-neutral transcript and generation types (`types`)
//! - The `ChatProvider` boundary and the live resolver (`client`)
//! - Anthropic Messages and OpenAI-compatible Chat Completions transports
//! - Configuration loading from `notechat.yaml`

pub mod anthropic;
pub mod catalog;
pub mod client;
pub mod config;
pub mod errors;
pub mod openai;
pub mod router;
pub mod types;

// Re-exports for convenience
pub use client::{ChatProvider, HttpProviderResolver, ProviderResolver};
pub use config::AssistantConfig;
pub use errors::InferenceError;
pub use router::{route, select_backend, ApiKeys, BackendCapabilities, BackendKind};
pub use types::{
    FunctionDefinition, GenerationConfig, GenerationResult, ToolCall, ToolDefinition, WireMessage,
};
