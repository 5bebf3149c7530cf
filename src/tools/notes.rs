//! The note tools.
//!
//! Every tool captures a shared [`ToolEnv`]: the request's note snapshot plus
//! the storage backend. Required arguments are enforced (missing or empty
//! values reject the call); optional ones have documented defaults.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::context::ToolContext;
use super::errors::{NoteStoreError, ToolError};
use super::registry::ToolRegistry;
use super::store::{is_note_file, NoteDraft, NoteStore};
use super::{NoteTool, ToolReply};

/// Default result cap for search and listing tools.
const DEFAULT_LIMIT: usize = 20;

/// Characters of context shown around a full-text match.
const SNIPPET_RADIUS: usize = 60;

// ─── Environment ─────────────────────────────────────────────────────────────

/// State shared by all tools of one chat request.
pub struct ToolEnv {
    pub context: ToolContext,
    pub store: Arc<dyn NoteStore>,
}

impl ToolEnv {
    pub fn new(context: ToolContext, store: Arc<dyn NoteStore>) -> Arc<Self> {
        Arc::new(Self { context, store })
    }

    /// Resolve a title to a note location.
    ///
    /// A snapshot hit is only trusted while the stored note still carries
    /// that title: tools earlier in the conversation may have renamed or
    /// deleted it. Otherwise, and for notes created mid-conversation, the
    /// root directory is scanned.
    async fn resolve_note(&self, title: &str) -> Result<PathBuf, ToolError> {
        let wanted = title.trim();

        if let Some(meta) = self.context.find_by_title(title) {
            match self.store.read(&meta.path).await {
                Ok(note) if note.title.trim().eq_ignore_ascii_case(wanted) => {
                    return Ok(meta.path.clone());
                }
                Ok(_) | Err(NoteStoreError::NotFound { .. }) => {
                    tracing::debug!(title = %wanted, path = %meta.path.display(), "snapshot entry is stale");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let entries = self.store.list_dir(&self.context.root_dir).await?;
        for path in entries.into_iter().filter(|p| is_note_file(p)) {
            if let Ok(note) = self.store.read(&path).await {
                if note.title.trim().eq_ignore_ascii_case(wanted) {
                    return Ok(path);
                }
            }
        }

        Err(ToolError::NoteNotFound {
            title: wanted.to_string(),
        })
    }
}

/// Build the registry of note tools, in the order they are advertised.
pub fn note_tools(env: Arc<ToolEnv>) -> ToolRegistry {
    let tools: Vec<Box<dyn NoteTool>> = vec![
        Box::new(CreateNote(env.clone())),
        Box::new(ReadNote(env.clone())),
        Box::new(UpdateNote(env.clone())),
        Box::new(DeleteNote(env.clone())),
        Box::new(RenameNote(env.clone())),
        Box::new(SearchNotes(env.clone())),
        Box::new(FullTextSearch(env.clone())),
        Box::new(ListNotes(env.clone())),
        Box::new(ListTags(env.clone())),
        Box::new(ReadCurrentNote(env)),
    ];

    let mut registry = ToolRegistry::new();
    for tool in tools {
        // Names above are distinct constants.
        if let Err(e) = registry.register(tool) {
            tracing::error!(error = %e, "failed to register note tool");
        }
    }
    registry
}

// ─── Argument helpers ────────────────────────────────────────────────────────

fn required_str<'a>(tool: &str, args: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    match args.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("'{field}' must not be empty"),
        }),
        Some(_) => Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("'{field}' must be a string"),
        }),
        None => Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("missing required field: '{field}'"),
        }),
    }
}

fn optional_str<'a>(args: &'a Value, field: &str) -> Option<&'a str> {
    args.get(field).and_then(|v| v.as_str())
}

/// Tags may arrive as an array or a comma-separated string.
fn optional_tags(args: &Value) -> Vec<String> {
    match args.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(normalize_tag)
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(normalize_tag)
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_string()
}

fn optional_limit(args: &Value) -> usize {
    args.get("limit")
        .and_then(|v| v.as_u64())
        .map(|n| n.clamp(1, 100) as usize)
        .unwrap_or(DEFAULT_LIMIT)
}

fn title_schema(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

// ─── create_note ─────────────────────────────────────────────────────────────

pub struct CreateNote(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for CreateNote {
    fn name(&self) -> &'static str {
        "create_note"
    }

    fn description(&self) -> &'static str {
        "Create a new note with a title, optional markdown content and optional tags."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": title_schema("Title of the new note"),
                "content": {"type": "string", "description": "Markdown body"},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["title"]
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let title = required_str(self.name(), arguments, "title")?;
        let draft = NoteDraft {
            title: title.trim().to_string(),
            body: optional_str(arguments, "content").unwrap_or_default().to_string(),
            tags: optional_tags(arguments),
        };

        let path = self.0.store.create(&self.0.context.root_dir, &draft).await?;
        tracing::info!(title = %draft.title, path = %path.display(), "note created by tool");

        Ok(ToolReply::json(&json!({
            "created": true,
            "title": draft.title,
            "tags": draft.tags,
        }))
        .with_created(path))
    }
}

// ─── read_note ───────────────────────────────────────────────────────────────

pub struct ReadNote(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for ReadNote {
    fn name(&self) -> &'static str {
        "read_note"
    }

    fn description(&self) -> &'static str {
        "Read the full content of a note by its title."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"title": title_schema("Title of the note to read")},
            "required": ["title"]
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let title = required_str(self.name(), arguments, "title")?;
        let path = self.0.resolve_note(title).await?;
        let note = self.0.store.read(&path).await?;
        Ok(ToolReply::json(&json!({
            "title": note.title,
            "tags": note.tags,
            "content": note.body,
        })))
    }
}

// ─── update_note ─────────────────────────────────────────────────────────────

pub struct UpdateNote(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for UpdateNote {
    fn name(&self) -> &'static str {
        "update_note"
    }

    fn description(&self) -> &'static str {
        "Replace the content of an existing note, or append to it with mode=\"append\"."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": title_schema("Title of the note to update"),
                "content": {"type": "string", "description": "New markdown content"},
                "mode": {"type": "string", "enum": ["replace", "append"]}
            },
            "required": ["title", "content"]
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let title = required_str(self.name(), arguments, "title")?;
        let content = optional_str(arguments, "content").ok_or_else(|| {
            ToolError::InvalidArguments {
                tool: self.name().to_string(),
                reason: "'content' must be a string".into(),
            }
        })?;
        let append = optional_str(arguments, "mode") == Some("append");

        let path = self.0.resolve_note(title).await?;
        let body = if append {
            let existing = self.0.store.read(&path).await?.body;
            if existing.is_empty() || existing.ends_with('\n') {
                format!("{existing}{content}")
            } else {
                format!("{existing}\n{content}")
            }
        } else {
            content.to_string()
        };
        self.0.store.write_body(&path, &body).await?;

        Ok(ToolReply::json(&json!({
            "updated": true,
            "title": title,
            "mode": if append { "append" } else { "replace" },
        })))
    }
}

// ─── delete_note ─────────────────────────────────────────────────────────────

pub struct DeleteNote(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for DeleteNote {
    fn name(&self) -> &'static str {
        "delete_note"
    }

    fn description(&self) -> &'static str {
        "Delete a note by its title."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"title": title_schema("Title of the note to delete")},
            "required": ["title"]
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let title = required_str(self.name(), arguments, "title")?;
        let path = self.0.resolve_note(title).await?;
        self.0.store.delete(&path).await?;
        tracing::info!(title = %title, path = %path.display(), "note deleted by tool");
        Ok(ToolReply::json(&json!({"deleted": true, "title": title})))
    }
}

// ─── rename_note ─────────────────────────────────────────────────────────────

pub struct RenameNote(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for RenameNote {
    fn name(&self) -> &'static str {
        "rename_note"
    }

    fn description(&self) -> &'static str {
        "Change the title of an existing note."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": title_schema("Current title"),
                "new_title": title_schema("New title")
            },
            "required": ["title", "new_title"]
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let title = required_str(self.name(), arguments, "title")?;
        let new_title = required_str(self.name(), arguments, "new_title")?.trim();
        let path = self.0.resolve_note(title).await?;
        self.0.store.rename(&path, new_title).await?;
        Ok(ToolReply::json(&json!({
            "renamed": true,
            "from": title,
            "to": new_title,
        })))
    }
}

// ─── search_notes ────────────────────────────────────────────────────────────

pub struct SearchNotes(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for SearchNotes {
    fn name(&self) -> &'static str {
        "search_notes"
    }

    fn description(&self) -> &'static str {
        "Find notes whose title or tags contain the query (case-insensitive)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 100}
            },
            "required": ["query"]
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let query = required_str(self.name(), arguments, "query")?
            .trim()
            .to_lowercase();
        let limit = optional_limit(arguments);

        let matches: Vec<Value> = self
            .0
            .context
            .notes
            .iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&query)
                    || n.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .take(limit)
            .map(|n| json!({"title": n.title, "tags": n.tags}))
            .collect();

        Ok(ToolReply::json(&json!({
            "query": query,
            "count": matches.len(),
            "results": matches,
        })))
    }
}

// ─── full_text_search ────────────────────────────────────────────────────────

pub struct FullTextSearch(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for FullTextSearch {
    fn name(&self) -> &'static str {
        "full_text_search"
    }

    fn description(&self) -> &'static str {
        "Search the content of every note and return matching snippets."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 100}
            },
            "required": ["query"]
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let query = required_str(self.name(), arguments, "query")?.trim();
        let needle = query.to_lowercase();
        let limit = optional_limit(arguments);

        let mut results = Vec::new();
        for meta in &self.0.context.notes {
            if results.len() >= limit {
                break;
            }
            let note = match self.0.store.read(&meta.path).await {
                Ok(note) => note,
                Err(e) => {
                    tracing::debug!(path = %meta.path.display(), error = %e, "skipping unreadable note");
                    continue;
                }
            };
            if let Some(snippet) = find_snippet(&note.body, &needle) {
                results.push(json!({"title": meta.title, "snippet": snippet}));
            }
        }

        Ok(ToolReply::json(&json!({
            "query": query,
            "count": results.len(),
            "results": results,
        })))
    }
}

/// Case-insensitive match with some surrounding context, on char boundaries.
fn find_snippet(body: &str, needle: &str) -> Option<String> {
    let lower = body.to_lowercase();
    // Lowercasing can change byte lengths; only use the offset when it maps
    // back onto the original text.
    let idx = lower.find(needle)?;
    let idx = if body.is_char_boundary(idx) && lower.len() == body.len() {
        idx
    } else {
        0
    };

    let start = body[..idx]
        .char_indices()
        .rev()
        .nth(SNIPPET_RADIUS.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = body[idx..]
        .char_indices()
        .nth(needle.chars().count() + SNIPPET_RADIUS)
        .map(|(i, _)| idx + i)
        .unwrap_or(body.len());

    let mut snippet = body[start..end].replace('\n', " ");
    if start > 0 {
        snippet.insert_str(0, "…");
    }
    if end < body.len() {
        snippet.push('…');
    }
    Some(snippet)
}

// ─── list_notes ──────────────────────────────────────────────────────────────

pub struct ListNotes(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for ListNotes {
    fn name(&self) -> &'static str {
        "list_notes"
    }

    fn description(&self) -> &'static str {
        "List note titles and tags, optionally only notes carrying a given tag."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tag": {"type": "string"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 100}
            }
        })
    }

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
        let tag = optional_str(arguments, "tag").map(normalize_tag);
        let limit = optional_limit(arguments);

        let notes: Vec<Value> = self
            .0
            .context
            .notes
            .iter()
            .filter(|n| match &tag {
                Some(tag) => n.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
                None => true,
            })
            .take(limit)
            .map(|n| json!({"title": n.title, "tags": n.tags}))
            .collect();

        Ok(ToolReply::json(&json!({
            "total": self.0.context.notes.len(),
            "notes": notes,
        })))
    }
}

// ─── list_tags ───────────────────────────────────────────────────────────────

pub struct ListTags(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for ListTags {
    fn name(&self) -> &'static str {
        "list_tags"
    }

    fn description(&self) -> &'static str {
        "List every tag in use with the number of notes carrying it."
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: &Value) -> Result<ToolReply, ToolError> {
        let tags: Vec<Value> = self
            .0
            .context
            .tag_counts()
            .into_iter()
            .map(|(tag, count)| json!({"tag": tag, "count": count}))
            .collect();
        Ok(ToolReply::json(&json!({"tags": tags})))
    }
}

// ─── read_current_note ───────────────────────────────────────────────────────

pub struct ReadCurrentNote(Arc<ToolEnv>);

#[async_trait]
impl NoteTool for ReadCurrentNote {
    fn name(&self) -> &'static str {
        "read_current_note"
    }

    fn description(&self) -> &'static str {
        "Read the note the user currently has open, including unsaved edits."
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: &Value) -> Result<ToolReply, ToolError> {
        let ctx = &self.0.context;
        let title = ctx.selected_meta().map(|m| m.title.clone());

        if let Some(text) = &ctx.editor_text {
            return Ok(ToolReply::json(&json!({
                "title": title,
                "content": text,
                "unsaved": true,
            })));
        }

        let path = ctx.selected_note.as_ref().ok_or_else(|| ToolError::Unavailable {
            reason: "no note is currently open".into(),
        })?;
        let note = self.0.store.read(path).await?;
        Ok(ToolReply::json(&json!({
            "title": note.title,
            "tags": note.tags,
            "content": note.body,
        })))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
