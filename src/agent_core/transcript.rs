//! Transcript adapter: chat history to wire transcript.
//!
//! Tool interactions are not replayed across invocations: every call
//! regenerates its own tool exchange inside the loop, so `tool` history
//! entries are dropped here.

use crate::inference::WireMessage;

use super::types::{ChatMessage, ChatRole};

/// Build the transcript for one invocation: one system entry, then the
/// user/assistant history in order.
pub fn build_transcript(system_prompt: &str, history: &[ChatMessage]) -> Vec<WireMessage> {
    let mut transcript = Vec::with_capacity(history.len() + 1);
    transcript.push(WireMessage::System(system_prompt.to_string()));

    for message in history {
        match message.role {
            ChatRole::User => transcript.push(WireMessage::User(message.content.clone())),
            ChatRole::Assistant => transcript.push(WireMessage::Assistant {
                text: message.content.clone(),
                tool_calls: Vec::new(),
            }),
            ChatRole::Tool => {}
        }
    }

    transcript
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_first_then_history_in_order() {
        let history = vec![
            ChatMessage::user("one"),
            ChatMessage::assistant("two"),
            ChatMessage::user("three"),
        ];
        let transcript = build_transcript("sys", &history);
        assert_eq!(
            transcript,
            vec![
                WireMessage::System("sys".into()),
                WireMessage::User("one".into()),
                WireMessage::Assistant {
                    text: "two".into(),
                    tool_calls: vec![]
                },
                WireMessage::User("three".into()),
            ]
        );
    }

    #[test]
    fn test_tool_history_is_dropped() {
        let history = vec![
            ChatMessage::user("make a note"),
            ChatMessage::new(ChatRole::Tool, "{\"created\":true}"),
            ChatMessage::assistant("done"),
            ChatMessage::new(ChatRole::Tool, "{\"deleted\":true}"),
        ];
        let transcript = build_transcript("sys", &history);
        assert_eq!(transcript.len(), 3);
        assert!(!transcript
            .iter()
            .any(|m| matches!(m, WireMessage::ToolOutput { .. })));
        assert_eq!(
            transcript
                .iter()
                .filter(|m| matches!(m, WireMessage::System(_)))
                .count(),
            1
        );
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(
            build_transcript("sys", &[]),
            vec![WireMessage::System("sys".into())]
        );
    }
}
