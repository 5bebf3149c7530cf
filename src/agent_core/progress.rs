//! Progress notifications for the UI.
//!
//! The sink is fire-and-forget: every notification is spawned onto the
//! runtime and never awaited, so a slow or failing sink cannot stall the
//! conversation loop.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::inference::ToolCall;

/// Asynchronous callback receiving short display strings.
pub type ProgressSink = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap a closure returning a future into a [`ProgressSink`].
pub fn progress_sink<F, Fut>(f: F) -> ProgressSink
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Arc::new(move |msg| Box::pin(f(msg)))
}

/// A sink that drops every message.
pub fn silent_sink() -> ProgressSink {
    Arc::new(|_| Box::pin(async {}))
}

/// Dispatch `message` to the sink without waiting for it.
///
/// The sink itself is invoked on the spawned task, so a sink that panics or
/// blocks before handing back its future never touches the caller.
pub fn notify(sink: &ProgressSink, message: String) {
    let sink = sink.clone();
    tokio::spawn(async move {
        sink(message).await;
    });
}

/// Notification sent before the first model call.
pub fn start_message(model: &str, note_count: usize, message_count: usize) -> String {
    format!(
        "🤖 Asking {model} ({note_count} {}, {message_count} {})",
        plural(note_count, "note", "notes"),
        plural(message_count, "message", "messages"),
    )
}

/// Icon plus a description of what a tool call is doing, built from its
/// arguments. Missing arguments fall back to placeholders.
pub fn describe_tool_call(call: &ToolCall) -> String {
    let args = &call.arguments;
    let title = || str_arg(args, "title").unwrap_or("Untitled");

    match call.name.as_str() {
        "create_note" => format!("📝 Creating note \"{}\"", title()),
        "read_note" => format!("📖 Reading \"{}\"", title()),
        "update_note" => {
            let verb = match str_arg(args, "mode") {
                Some("append") => "Appending to",
                _ => "Updating",
            };
            format!("✏️ {verb} \"{}\"", title())
        }
        "delete_note" => format!("🗑️ Deleting \"{}\"", title()),
        "rename_note" => format!(
            "🏷️ Renaming \"{}\" to \"{}\"",
            title(),
            str_arg(args, "new_title").unwrap_or("Untitled")
        ),
        "search_notes" => format!(
            "🔍 Searching titles for \"{}\"",
            str_arg(args, "query").unwrap_or("")
        ),
        "full_text_search" => format!(
            "🔎 Searching note contents for \"{}\"",
            str_arg(args, "query").unwrap_or("")
        ),
        "list_notes" => match str_arg(args, "tag") {
            Some(tag) => format!("📚 Listing notes tagged #{}", tag.trim_start_matches('#')),
            None => "📚 Listing notes".to_string(),
        },
        "list_tags" => "🏷️ Listing tags".to_string(),
        "read_current_note" => "👀 Reading the current note".to_string(),
        other => format!("🔧 Running {other}"),
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            id: "c".into(),
            name: name.into(),
            arguments: args,
        }
    }

    #[test]
    fn test_start_message() {
        assert_eq!(
            start_message("gpt-4o", 3, 1),
            "🤖 Asking gpt-4o (3 notes, 1 message)"
        );
    }

    #[test]
    fn test_describe_uses_arguments() {
        assert_eq!(
            describe_tool_call(&call("create_note", json!({"title": "Groceries"}))),
            "📝 Creating note \"Groceries\""
        );
        assert_eq!(
            describe_tool_call(&call(
                "update_note",
                json!({"title": "Log", "mode": "append"})
            )),
            "✏️ Appending to \"Log\""
        );
        assert_eq!(
            describe_tool_call(&call("list_notes", json!({"tag": "#work"}))),
            "📚 Listing notes tagged #work"
        );
    }

    #[test]
    fn test_describe_falls_back_when_arguments_missing() {
        assert_eq!(
            describe_tool_call(&call("create_note", json!({}))),
            "📝 Creating note \"Untitled\""
        );
        assert_eq!(
            describe_tool_call(&call("delete_note", json!({"title": "  "}))),
            "🗑️ Deleting \"Untitled\""
        );
        assert_eq!(
            describe_tool_call(&call("mystery", json!(null))),
            "🔧 Running mystery"
        );
    }

    #[tokio::test]
    async fn test_notify_delivers_without_blocking() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = progress_sink(move |msg| {
            let tx = tx.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let _ = tx.send(msg);
            }
        });

        notify(&sink, "hello".into());
        assert!(rx.try_recv().is_err());

        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(got.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_panicking_sink_is_contained() {
        let sink = progress_sink(|_msg| async move { panic!("sink exploded") });
        notify(&sink, "boom".into());
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn test_sink_panicking_before_returning_future_is_contained() {
        let sink: ProgressSink = Arc::new(|_msg: String| -> BoxFuture<'static, ()> {
            panic!("sink exploded synchronously")
        });
        notify(&sink, "boom".into());
        tokio::task::yield_now().await;
    }
}
