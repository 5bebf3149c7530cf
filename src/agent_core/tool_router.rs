//! ToolRouter: executes the model's tool calls against the registry.
//!
//! Calls run sequentially in the order the model issued them, producing
//! exactly one [`ToolOutput`] per call. Failures never abort the batch: an
//! unknown tool, invalid arguments, or a tool error becomes an error payload
//! the model can read and react to on the next round.

use std::time::Instant;

use crate::inference::ToolCall;
use crate::tools::{ToolError, ToolRegistry};

use super::types::ToolOutput;

/// Maximum characters allowed in a single tool result before truncation.
///
/// Keeps one large note from crowding the rest of the context window.
pub const MAX_TOOL_RESULT_CHARS: usize = 6_000;

/// Dispatches tool calls to the registered tools.
pub struct ToolRouter<'a> {
    registry: &'a ToolRegistry,
}

impl<'a> ToolRouter<'a> {
    pub fn new(registry: &'a ToolRegistry) -> Self {
        Self { registry }
    }

    /// Execute a batch of tool calls.
    ///
    /// The returned outputs match `tool_calls` in length and order.
    pub async fn dispatch_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(tool_calls.len());
        for tc in tool_calls {
            outputs.push(self.dispatch_single(tc).await);
        }
        outputs
    }

    /// Execute one tool call: validate → call → wrap.
    pub async fn dispatch_single(&self, tool_call: &ToolCall) -> ToolOutput {
        let start = Instant::now();

        let result = match self
            .registry
            .validate_tool_call(&tool_call.name, &tool_call.arguments)
        {
            Ok(()) => match self.registry.get(&tool_call.name) {
                Some(tool) => tool.call(&tool_call.arguments).await,
                None => Err(ToolError::UnknownTool {
                    name: tool_call.name.clone(),
                }),
            },
            Err(e) => Err(e),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(reply) => {
                tracing::info!(
                    tool = %tool_call.name,
                    elapsed_ms,
                    result_len = reply.content.len(),
                    "tool call succeeded"
                );
                ToolOutput {
                    call_id: tool_call.id.clone(),
                    tool_name: tool_call.name.clone(),
                    content: truncate_tool_result(&reply.content, &tool_call.name),
                    is_error: false,
                    created: reply.created,
                }
            }
            Err(e) => {
                tracing::warn!(
                    tool = %tool_call.name,
                    elapsed_ms,
                    error = %e,
                    "tool call failed"
                );
                ToolOutput {
                    call_id: tool_call.id.clone(),
                    tool_name: tool_call.name.clone(),
                    content: error_payload(&e),
                    is_error: true,
                    created: None,
                }
            }
        }
    }
}

/// Serialize a tool failure for the model.
pub fn error_payload(err: &ToolError) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

/// Truncate a tool result if it exceeds `MAX_TOOL_RESULT_CHARS`.
///
/// Preserves the beginning of the result and appends a truncation notice.
fn truncate_tool_result(result: &str, tool_name: &str) -> String {
    if result.len() <= MAX_TOOL_RESULT_CHARS {
        return result.to_string();
    }

    let truncated = truncate_utf8(result, MAX_TOOL_RESULT_CHARS);
    tracing::warn!(
        tool = %tool_name,
        original_len = result.len(),
        truncated_to = truncated.len(),
        "tool result truncated"
    );
    format!(
        "{truncated}\n\n[... truncated: showing first {} of {} chars]",
        truncated.len(),
        result.len()
    )
}

/// Longest prefix of `s` of at most `max_bytes` bytes ending on a char boundary.
fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ─── Tests ──────────────────────────────────────────────────────────────────
