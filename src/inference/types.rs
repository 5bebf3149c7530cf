//! Backend-neutral types shared by every provider client.
//!
//! The conversation loop builds a transcript of [`WireMessage`]s; each
//! provider translates it into its own request format and reduces the
//! response back to a [`GenerationResult`].

use serde::{Deserialize, Serialize};

// ─── Transcript ──────────────────────────────────────────────────────────────

/// One entry of the backend-neutral transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    System(String),
    User(String),
    /// Assistant turn. `tool_calls` is empty for plain text replies.
    Assistant {
        text: String,
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call, correlated by `call_id`.
    ToolOutput {
        call_id: String,
        tool_name: String,
        content: String,
    },
}

/// A parsed tool call extracted from the model's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call (generated if the model doesn't provide one).
    pub id: String,
    /// Tool name, e.g. `"create_note"`.
    pub name: String,
    /// Arguments as sent by the model.
    pub arguments: serde_json::Value,
}

// ─── Tool advertisement ──────────────────────────────────────────────────────

/// Tool definition in the OpenAI function format.
///
/// Anthropic requests are built from the same definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub r#type: String,
    pub function: FunctionDefinition,
}

/// Function definition within a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn function(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// Per-call generation settings handed to a provider.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Tools the model may call this round.
    pub tools: Vec<ToolDefinition>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// What a provider produced for one round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    pub text: String,
    /// Tool calls in the order the model issued them.
    pub tool_calls: Vec<ToolCall>,
}

impl GenerationResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition_serializes_as_openai_function() {
        let def = ToolDefinition::function(
            "list_tags",
            "List tags",
            serde_json::json!({"type": "object", "properties": {}}),
        );
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "list_tags");
    }

    #[test]
    fn test_has_tool_calls() {
        assert!(!GenerationResult::text("hi").has_tool_calls());
        let result = GenerationResult {
            text: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "list_notes".into(),
                arguments: serde_json::json!({}),
            }],
        };
        assert!(result.has_tool_calls());
    }
}
