//! Anthropic Messages API client.
//!
//! The Messages API differs from Chat Completions in three ways that matter
//! here: the system prompt is a top-level field, tool calls are `tool_use`
//! content blocks, and tool results travel back inside a `user` message as
//! `tool_result` blocks.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::catalog::canonical_anthropic_model;
use super::client::{read_success_body, ChatProvider};
use super::errors::InferenceError;
use super::types::{GenerationConfig, GenerationResult, ToolCall, WireMessage};

const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// Request body for `POST /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<AnthropicTool>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnthropicMessage {
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnthropicTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

// ─── Client ──────────────────────────────────────────────────────────────────

pub struct AnthropicClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl AnthropicClient {
    pub fn new(http: HttpClient, base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicClient {
    async fn generate(
        &self,
        transcript: &[WireMessage],
        model: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult, InferenceError> {
        let url = format!("{}/messages", self.base_url);
        let body = build_request(transcript, model, config);

        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            tool_count = body.tools.len(),
            max_tokens = body.max_tokens,
            "anthropic messages request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::from_send(&url, &e, self.timeout_secs))?;
        let body_text = read_success_body(response).await?;

        parse_response(&body_text)
    }
}

// ─── Request / Response mapping ──────────────────────────────────────────────

/// Translate the neutral transcript into a Messages API request.
///
/// Consecutive tool outputs are merged into a single `user` message, which
/// is what the API expects after an assistant turn with several `tool_use`
/// blocks.
pub fn build_request(
    transcript: &[WireMessage],
    model: &str,
    config: &GenerationConfig,
) -> MessagesRequest {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut messages: Vec<AnthropicMessage> = Vec::new();

    for entry in transcript {
        match entry {
            WireMessage::System(text) => system_parts.push(text),
            WireMessage::User(text) => messages.push(AnthropicMessage {
                role: "user",
                content: vec![ContentBlock::Text { text: text.clone() }],
            }),
            WireMessage::Assistant { text, tool_calls } => {
                let mut content = Vec::with_capacity(tool_calls.len() + 1);
                if !text.trim().is_empty() {
                    content.push(ContentBlock::Text { text: text.clone() });
                }
                content.extend(tool_calls.iter().map(|tc| ContentBlock::ToolUse {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    input: tc.arguments.clone(),
                }));
                // The API rejects messages without content blocks.
                if content.is_empty() {
                    continue;
                }
                messages.push(AnthropicMessage {
                    role: "assistant",
                    content,
                });
            }
            WireMessage::ToolOutput {
                call_id, content, ..
            } => {
                let block = ContentBlock::ToolResult {
                    tool_use_id: call_id.clone(),
                    content: content.clone(),
                };
                match messages.last_mut() {
                    Some(last)
                        if last.role == "user"
                            && last
                                .content
                                .iter()
                                .all(|b| matches!(b, ContentBlock::ToolResult { .. })) =>
                    {
                        last.content.push(block);
                    }
                    _ => messages.push(AnthropicMessage {
                        role: "user",
                        content: vec![block],
                    }),
                }
            }
        }
    }

    let tools = config
        .tools
        .iter()
        .map(|t| AnthropicTool {
            name: t.function.name.clone(),
            description: t.function.description.clone(),
            input_schema: t.function.parameters.clone(),
        })
        .collect();

    MessagesRequest {
        model: canonical_anthropic_model(model).to_string(),
        max_tokens: config.max_tokens,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        messages,
        tools,
        temperature: config.temperature,
    }
}

/// Parse a Messages API response body.
pub fn parse_response(body: &str) -> Result<GenerationResult, InferenceError> {
    #[derive(Deserialize)]
    struct Response {
        content: Vec<Value>,
    }

    let resp: Response = serde_json::from_str(body).map_err(|e| InferenceError::ResponseError {
        reason: format!("failed to parse messages response: {e}"),
    })?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for raw in resp.content {
        // Unknown block kinds (thinking, server tools) are skipped.
        match serde_json::from_value::<ContentBlock>(raw) {
            Ok(ContentBlock::Text { text: t }) => text.push_str(&t),
            Ok(ContentBlock::ToolUse { id, name, input }) => tool_calls.push(ToolCall {
                id,
                name,
                arguments: if input.is_null() { json!({}) } else { input },
            }),
            Ok(ContentBlock::ToolResult { .. }) | Err(_) => {}
        }
    }

    Ok(GenerationResult { text, tool_calls })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::types::ToolDefinition;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gen_config() -> GenerationConfig {
        GenerationConfig {
            tools: vec![ToolDefinition::function(
                "list_tags",
                "List all tags",
                json!({"type": "object", "properties": {}}),
            )],
            temperature: 0.5,
            max_tokens: 1024,
        }
    }

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: json!({}),
        }
    }

    #[test]
    fn test_build_request_hoists_system_and_merges_tool_results() {
        let transcript = vec![
            WireMessage::System("sys".into()),
            WireMessage::User("hi".into()),
            WireMessage::Assistant {
                text: "Checking".into(),
                tool_calls: vec![call("t1", "list_tags"), call("t2", "list_notes")],
            },
            WireMessage::ToolOutput {
                call_id: "t1".into(),
                tool_name: "list_tags".into(),
                content: "[]".into(),
            },
            WireMessage::ToolOutput {
                call_id: "t2".into(),
                tool_name: "list_notes".into(),
                content: "[]".into(),
            },
        ];

        let req = build_request(&transcript, "claude-3-5-haiku-latest", &gen_config());
        assert_eq!(req.system.as_deref(), Some("sys"));
        assert_eq!(req.model, "claude-3-5-haiku-20241022");
        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.messages[1].content.len(), 3, "text + two tool_use blocks");
        assert_eq!(req.messages[2].role, "user");
        assert_eq!(
            req.messages[2].content,
            vec![
                ContentBlock::ToolResult {
                    tool_use_id: "t1".into(),
                    content: "[]".into()
                },
                ContentBlock::ToolResult {
                    tool_use_id: "t2".into(),
                    content: "[]".into()
                },
            ]
        );
        assert_eq!(req.tools[0].name, "list_tags");
    }

    #[test]
    fn test_build_request_skips_empty_assistant_turns() {
        let transcript = vec![
            WireMessage::System("sys".into()),
            WireMessage::User("first".into()),
            WireMessage::Assistant {
                text: String::new(),
                tool_calls: vec![],
            },
            WireMessage::User("second".into()),
            WireMessage::Assistant {
                text: "  ".into(),
                tool_calls: vec![call("t1", "list_tags")],
            },
        ];
        let req = build_request(&transcript, "claude-3-5-haiku-latest", &gen_config());

        assert_eq!(req.messages.len(), 3);
        assert!(req.messages.iter().all(|m| !m.content.is_empty()));
        assert_eq!(req.messages[1].role, "user");
        assert_eq!(
            req.messages[2].content,
            vec![ContentBlock::ToolUse {
                id: "t1".into(),
                name: "list_tags".into(),
                input: json!({}),
            }]
        );
    }

    #[test]
    fn test_parse_response_mixed_blocks() {
        let body = r#"{"id":"msg_1","content":[
            {"type":"text","text":"Let me look."},
            {"type":"tool_use","id":"toolu_1","name":"search_notes","input":{"query":"rust"}},
            {"type":"tool_use","id":"toolu_2","name":"list_tags","input":{}}
        ],"stop_reason":"tool_use"}"#;
        let result = parse_response(body).unwrap();
        assert_eq!(result.text, "Let me look.");
        assert_eq!(result.tool_calls.len(), 2);
        assert_eq!(result.tool_calls[0].id, "toolu_1");
        assert_eq!(result.tool_calls[0].arguments["query"], "rust");
        assert_eq!(result.tool_calls[1].name, "list_tags");
    }

    #[test]
    fn test_parse_response_skips_unknown_blocks() {
        let body = r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"Hi"}]}"#;
        assert_eq!(parse_response(body).unwrap().text, "Hi");
    }

    #[tokio::test]
    async fn test_generate_sends_anthropic_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-ant"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"content":[{"type":"text","text":"Hello"}],"stop_reason":"end_turn"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(HttpClient::new(), &server.uri(), "sk-ant", 30);
        let result = client
            .generate(
                &[WireMessage::System("s".into()), WireMessage::User("u".into())],
                "claude-sonnet-4-0",
                &gen_config(),
            )
            .await
            .unwrap();
        assert_eq!(result, GenerationResult::text("Hello"));
    }

    #[tokio::test]
    async fn test_generate_surfaces_overloaded_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = AnthropicClient::new(HttpClient::new(), &server.uri(), "sk-ant", 30);
        let err = client
            .generate(&[WireMessage::User("u".into())], "claude-opus-4-0", &gen_config())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::HttpError { status: 529, .. }));
    }
}
