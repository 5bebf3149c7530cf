//! OpenAI Chat Completions client.
//!
//! Serves both the direct OpenAI backend and the OpenRouter catch-all, which
//! speaks the same wire format and accepts `vendor/model` identifiers.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::is_openai_reasoning_model;
use super::client::{read_success_body, ChatProvider};
use super::errors::InferenceError;
use super::types::{GenerationConfig, GenerationResult, ToolCall, ToolDefinition, WireMessage};

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// A single message in the Chat Completions request.
///
/// `content` is serialized as `""` rather than `null` for assistant messages
/// that only carry tool calls; several OpenAI-compatible gateways reject `null`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(serialize_with = "serialize_content")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallResponse>>,
}

fn serialize_content<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Tool call as carried in the OpenAI format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub id: String,
    pub r#type: String,
    pub function: FunctionCallResponse,
}

/// Function call details; `arguments` is a JSON-encoded string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallResponse {
    pub name: String,
    pub arguments: String,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    /// Omitted for reasoning models, which only accept the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Output cap for reasoning models, which reject `max_tokens`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    pub stream: bool,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Client for any OpenAI-compatible Chat Completions endpoint.
pub struct OpenAiCompatClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    /// Extra headers (OpenRouter attribution).
    extra_headers: Vec<(&'static str, String)>,
}

impl OpenAiCompatClient {
    /// Client for the direct OpenAI API.
    pub fn openai(http: HttpClient, base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
            extra_headers: Vec::new(),
        }
    }

    /// Client for OpenRouter, with its app attribution headers.
    pub fn openrouter(
        http: HttpClient,
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
        app_name: &str,
        app_url: &str,
    ) -> Self {
        let mut client = Self::openai(http, base_url, api_key, timeout_secs);
        client.extra_headers = vec![
            ("HTTP-Referer", app_url.to_string()),
            ("X-Title", app_name.to_string()),
        ];
        client
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatClient {
    async fn generate(
        &self,
        transcript: &[WireMessage],
        model: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_request(transcript, model, config);

        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            tool_count = body.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            max_tokens = body.max_tokens.or(body.max_completion_tokens).unwrap_or_default(),
            "chat completion request"
        );

        let mut request = self.http.post(&url).bearer_auth(&self.api_key).json(&body);
        for (name, value) in &self.extra_headers {
            request = request.header(*name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InferenceError::from_send(&url, &e, self.timeout_secs))?;
        let body_text = read_success_body(response).await?;

        parse_response(&body_text)
    }
}

// ─── Request / Response mapping ──────────────────────────────────────────────

/// Translate the neutral transcript into a Chat Completions request.
pub fn build_request(
    transcript: &[WireMessage],
    model: &str,
    config: &GenerationConfig,
) -> ChatCompletionRequest {
    let messages = transcript.iter().map(to_chat_message).collect();
    let tools = (!config.tools.is_empty()).then(|| config.tools.clone());
    let reasoning = is_openai_reasoning_model(model);

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        tool_choice: tools.as_ref().map(|_| "auto".to_string()),
        tools,
        temperature: (!reasoning).then_some(config.temperature),
        max_tokens: (!reasoning).then_some(config.max_tokens),
        max_completion_tokens: reasoning.then_some(config.max_tokens),
        stream: false,
    }
}

fn to_chat_message(message: &WireMessage) -> ChatMessage {
    match message {
        WireMessage::System(text) => plain(Role::System, text),
        WireMessage::User(text) => plain(Role::User, text),
        WireMessage::Assistant { text, tool_calls } if tool_calls.is_empty() => {
            plain(Role::Assistant, text)
        }
        WireMessage::Assistant { text, tool_calls } => ChatMessage {
            role: Role::Assistant,
            content: (!text.is_empty()).then(|| text.clone()),
            tool_call_id: None,
            tool_calls: Some(
                tool_calls
                    .iter()
                    .map(|tc| ToolCallResponse {
                        id: tc.id.clone(),
                        r#type: "function".to_string(),
                        function: FunctionCallResponse {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect(),
            ),
        },
        WireMessage::ToolOutput {
            call_id, content, ..
        } => ChatMessage {
            role: Role::Tool,
            content: Some(content.clone()),
            tool_call_id: Some(call_id.clone()),
            tool_calls: None,
        },
    }
}

fn plain(role: Role, text: &str) -> ChatMessage {
    ChatMessage {
        role,
        content: Some(text.to_string()),
        tool_call_id: None,
        tool_calls: None,
    }
}

/// Parse a non-streaming Chat Completions response body.
pub fn parse_response(body: &str) -> Result<GenerationResult, InferenceError> {
    #[derive(Deserialize)]
    struct Response {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: Message,
    }

    #[derive(Deserialize)]
    struct Message {
        content: Option<String>,
        tool_calls: Option<Vec<ResponseToolCall>>,
    }

    #[derive(Deserialize)]
    struct ResponseToolCall {
        id: Option<String>,
        function: FunctionCallResponse,
    }

    let resp: Response = serde_json::from_str(body).map_err(|e| InferenceError::ResponseError {
        reason: format!("failed to parse chat completion: {e}"),
    })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(InferenceError::ResponseError {
            reason: "empty choices array".into(),
        })?;

    let mut tool_calls = Vec::new();
    for tc in choice.message.tool_calls.unwrap_or_default() {
        let raw = tc.function.arguments.trim();
        // Some gateways send "" for tools that take no arguments.
        let arguments = if raw.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(raw).map_err(|e| InferenceError::ToolCallParseError {
                raw_response: tc.function.arguments.clone(),
                reason: format!("invalid JSON: {e}"),
            })?
        };
        tool_calls.push(ToolCall {
            id: tc.id.unwrap_or_else(|| format!("call_{}", Uuid::new_v4())),
            name: tc.function.name,
            arguments,
        });
    }

    Ok(GenerationResult {
        text: choice.message.content.unwrap_or_default(),
        tool_calls,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gen_config(tools: Vec<ToolDefinition>) -> GenerationConfig {
        GenerationConfig {
            tools,
            temperature: 0.3,
            max_tokens: 512,
        }
    }

    fn sample_transcript() -> Vec<WireMessage> {
        vec![
            WireMessage::System("You are helpful.".into()),
            WireMessage::User("Make a note".into()),
            WireMessage::Assistant {
                text: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call_1".into(),
                    name: "create_note".into(),
                    arguments: serde_json::json!({"title": "Groceries"}),
                }],
            },
            WireMessage::ToolOutput {
                call_id: "call_1".into(),
                tool_name: "create_note".into(),
                content: "{\"created\":true}".into(),
            },
        ]
    }

    #[test]
    fn test_build_request_maps_roles_in_order() {
        let req = build_request(&sample_transcript(), "gpt-4o", &gen_config(vec![]));
        let roles: Vec<Role> = req.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool]
        );
        assert_eq!(req.messages[3].tool_call_id.as_deref(), Some("call_1"));
        assert!(req.tools.is_none(), "no tools means the field is omitted");
        assert!(req.tool_choice.is_none());
    }

    #[test]
    fn test_chat_model_sends_temperature_and_max_tokens() {
        let req = build_request(&sample_transcript(), "gpt-4o", &gen_config(vec![]));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_tokens"], 512);
        assert!((json["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!(json.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_reasoning_model_sends_max_completion_tokens_only() {
        for model in ["o3", "o4-mini", "gpt-5-mini"] {
            let req = build_request(&sample_transcript(), model, &gen_config(vec![]));
            let json = serde_json::to_value(&req).unwrap();
            assert_eq!(json["max_completion_tokens"], 512, "{model}");
            assert!(json.get("max_tokens").is_none(), "{model}");
            assert!(json.get("temperature").is_none(), "{model}");
        }
    }

    #[test]
    fn test_tool_call_message_content_is_empty_string() {
        let req = build_request(&sample_transcript(), "gpt-4o", &gen_config(vec![]));
        let json = serde_json::to_value(&req.messages[2]).unwrap();
        assert_eq!(json["content"], "");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "create_note");
        assert_eq!(
            json["tool_calls"][0]["function"]["arguments"],
            "{\"title\":\"Groceries\"}"
        );
    }

    #[test]
    fn test_parse_response_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"},"finish_reason":"stop"}]}"#;
        let result = parse_response(body).unwrap();
        assert_eq!(result.text, "Hello");
        assert!(!result.has_tool_calls());
    }

    #[test]
    fn test_parse_response_tool_calls_keep_order() {
        let body = r#"{"choices":[{"message":{"content":null,"tool_calls":[
            {"id":"a","type":"function","function":{"name":"list_notes","arguments":""}},
            {"id":"b","type":"function","function":{"name":"read_note","arguments":"{\"title\":\"X\"}"}}
        ]}}]}"#;
        let result = parse_response(body).unwrap();
        assert_eq!(result.text, "");
        let names: Vec<&str> = result.tool_calls.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list_notes", "read_note"]);
        assert_eq!(result.tool_calls[0].arguments, serde_json::json!({}));
        assert_eq!(result.tool_calls[1].arguments["title"], "X");
    }

    #[test]
    fn test_parse_response_invalid_arguments() {
        let body = r#"{"choices":[{"message":{"tool_calls":[
            {"id":"a","type":"function","function":{"name":"read_note","arguments":"{title"}}
        ]}}]}"#;
        assert!(matches!(
            parse_response(body),
            Err(InferenceError::ToolCallParseError { .. })
        ));
    }

    #[test]
    fn test_parse_response_empty_choices() {
        assert!(parse_response(r#"{"choices":[]}"#).is_err());
    }

    #[tokio::test]
    async fn test_generate_against_mock_openrouter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-or"))
            .and(header("x-title", "Notechat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"content":"Done"}}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::openrouter(
            HttpClient::new(),
            &server.uri(),
            "sk-or",
            30,
            "Notechat",
            "https://example.com",
        );
        let result = client
            .generate(&sample_transcript(), "mistralai/mistral-large", &gen_config(vec![]))
            .await
            .unwrap();
        assert_eq!(result.text, "Done");
    }

    #[tokio::test]
    async fn test_generate_surfaces_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::openai(HttpClient::new(), &server.uri(), "bad", 30);
        let err = client
            .generate(&sample_transcript(), "gpt-4o", &gen_config(vec![]))
            .await
            .unwrap_err();
        match err {
            InferenceError::HttpError { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
