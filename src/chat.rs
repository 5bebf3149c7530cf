//! Chat service: the entry point the UI calls for every user message.
//!
//! Wires one invocation together: system prompt, transcript, per-request
//! tool registry and the conversation loop. Nothing is cached between
//! calls; keys, model and the note snapshot arrive with every request.

use std::path::Path;
use std::sync::Arc;

use crate::agent_core::{
    build_transcript, ChatError, ChatMessage, ChatResult, ConversationLoop, LoopInput,
    LoopSettings, ProgressSink,
};
use crate::inference::config::{find_config_path, load_config};
use crate::inference::{ApiKeys, AssistantConfig, HttpProviderResolver, ProviderResolver};
use crate::prompt::{DefaultPromptBuilder, PromptInputs, SystemPromptBuilder};
use crate::tools::{note_tools, FsNoteStore, NoteStore, ToolContext, ToolEnv};

/// Everything one chat invocation needs.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub keys: ApiKeys,
    /// Free-text model identifier, routed to a backend at call time.
    pub model: String,
    /// Chat history, oldest first. The latest user message is the last entry.
    pub messages: Vec<ChatMessage>,
    /// Extra context for the system prompt.
    pub note_context: Option<String>,
    pub context: ToolContext,
}

/// The notes assistant.
pub struct NoteAssistant {
    resolver: Arc<dyn ProviderResolver>,
    store: Arc<dyn NoteStore>,
    prompt_builder: Arc<dyn SystemPromptBuilder>,
    settings: LoopSettings,
}

impl NoteAssistant {
    pub fn new(
        resolver: Arc<dyn ProviderResolver>,
        store: Arc<dyn NoteStore>,
        prompt_builder: Arc<dyn SystemPromptBuilder>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            resolver,
            store,
            prompt_builder,
            settings,
        }
    }

    /// Live assistant: HTTP providers, markdown files on disk, default prompt.
    pub fn from_config(config: AssistantConfig) -> Result<Self, ChatError> {
        let settings = LoopSettings::from_config(&config);
        let resolver = HttpProviderResolver::new(config)
            .map_err(|e| ChatError::ProviderError(e.to_string()))?;
        Ok(Self::new(
            Arc::new(resolver),
            Arc::new(FsNoteStore::new()),
            Arc::new(DefaultPromptBuilder),
            settings,
        ))
    }

    /// Like [`from_config`](Self::from_config), reading `notechat.yaml`
    /// found from `start` (or `NOTECHAT_CONFIG`). Falls back to defaults
    /// when no config file exists.
    pub fn discover(start: &Path) -> Result<Self, ChatError> {
        let config = match find_config_path(start) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "loading assistant config");
                load_config(&path).map_err(|e| ChatError::ProviderError(e.to_string()))?
            }
            Err(e) => {
                tracing::info!(reason = %e, "no config file, using defaults");
                AssistantConfig::default()
            }
        };
        Self::from_config(config)
    }

    /// Answer the latest message of `request.messages`.
    pub async fn send_message(
        &self,
        request: ChatRequest,
        progress: ProgressSink,
    ) -> Result<ChatResult, ChatError> {
        let ChatRequest {
            keys,
            model,
            messages,
            note_context,
            context,
        } = request;

        let tags = context.known_tags();
        let system_prompt = self.prompt_builder.build(&PromptInputs {
            note_count: context.notes.len(),
            tags: &tags,
            note_context: note_context.as_deref(),
        });
        let transcript = build_transcript(&system_prompt, &messages);

        let note_count = context.notes.len();
        let notes_dir = context.root_dir.clone();
        let registry = note_tools(ToolEnv::new(context, self.store.clone()));

        let conversation = ConversationLoop::new(
            self.resolver.clone(),
            registry,
            self.store.clone(),
            notes_dir,
            self.settings.clone(),
        );

        let result = conversation
            .run(LoopInput {
                model: &model,
                keys: &keys,
                transcript,
                note_count,
                message_count: messages.len(),
                progress,
            })
            .await;

        if let Err(e) = &result {
            tracing::warn!(model = %model, error = %e, "chat invocation failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_core::silent_sink;
    use crate::inference::BackendKind;
    use crate::tools::NoteMeta;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AssistantConfig {
        AssistantConfig {
            openai_base_url: server.uri(),
            openrouter_base_url: server.uri(),
            ..AssistantConfig::default()
        }
    }

    fn request(dir: &Path, model: &str, keys: ApiKeys) -> ChatRequest {
        ChatRequest {
            keys,
            model: model.into(),
            messages: vec![ChatMessage::user("Make a note called Test")],
            note_context: None,
            context: ToolContext {
                root_dir: dir.to_path_buf(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_end_to_end_create_note_over_http() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-oai"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"content":null,"tool_calls":[{"id":"call_1","type":"function","function":{"name":"create_note","arguments":"{\"title\":\"Test\",\"content\":\"hello\"}"}}]}}]}"#,
            ))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("call_1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"content":"Created"}}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let assistant = NoteAssistant::from_config(config_for(&server)).unwrap();
        let keys = ApiKeys {
            openai: "sk-oai".into(),
            ..Default::default()
        };

        let result = assistant
            .send_message(request(dir.path(), "gpt-4o", keys), silent_sink())
            .await
            .unwrap();

        assert_eq!(result.text, "Created");
        assert_eq!(result.created.len(), 1);
        let note = FsNoteStore::new().read(&result.created[0]).await.unwrap();
        assert_eq!(note.title, "Test");
        assert_eq!(note.body, "hello");
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let assistant = NoteAssistant::from_config(config_for(&server)).unwrap();
        let err = assistant
            .send_message(
                request(dir.path(), "mistralai/mistral-large", ApiKeys::default()),
                silent_sink(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChatError::NoApiKey {
                backend: BackendKind::OpenRouter
            }
        ));
    }

    #[tokio::test]
    async fn test_system_prompt_carries_snapshot() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("The vault contains 1 note."))
            .and(body_string_contains("#recipes"))
            .and(body_string_contains("Pasta for four"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"content":"Sure"}}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let assistant = NoteAssistant::from_config(config_for(&server)).unwrap();
        let mut req = request(
            dir.path(),
            "gpt-4o-mini",
            ApiKeys {
                openai: "sk-oai".into(),
                ..Default::default()
            },
        );
        req.note_context = Some("Pasta for four".into());
        req.context.notes = vec![NoteMeta {
            title: "Pasta".into(),
            tags: vec!["recipes".into()],
            path: dir.path().join("pasta.md"),
        }];

        let result = assistant.send_message(req, silent_sink()).await.unwrap();
        assert_eq!(result.text, "Sure");
    }
}
