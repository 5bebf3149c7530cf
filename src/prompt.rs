//! System prompt construction.
//!
//! The engine only needs *a* system prompt; [`SystemPromptBuilder`] is the
//! seam for callers that bring their own wording. [`DefaultPromptBuilder`]
//! is a compact default that describes the vault and the tool rules.

/// What the prompt builder knows about the vault.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub note_count: usize,
    /// Distinct tags, sorted.
    pub tags: &'a [String],
    /// Extra context the caller wants the model to see (e.g. the open note).
    pub note_context: Option<&'a str>,
}

/// Produces the system prompt of one invocation.
pub trait SystemPromptBuilder: Send + Sync {
    fn build(&self, inputs: &PromptInputs<'_>) -> String;
}

/// Tags listed in the prompt before the rest is summarized as a count.
const MAX_PROMPT_TAGS: usize = 50;

const SYSTEM_PROMPT_INTRO: &str = "You are a helpful assistant inside a markdown notes app. \
You can read, create, edit, rename, delete and search the user's notes with the tools provided.";

const SYSTEM_PROMPT_RULES: &str = "\
Rules:\n\
1. Refer to notes by their exact title.\n\
2. Before editing or deleting a note you have not seen, read it first.\n\
3. Only report results you actually received from tool calls. Never invent note contents.\n\
4. When the user asks about \"this note\" or \"the current note\", use read_current_note.\n\
5. Be concise and answer in the user's language.";

#[derive(Debug, Clone, Default)]
pub struct DefaultPromptBuilder;

impl SystemPromptBuilder for DefaultPromptBuilder {
    fn build(&self, inputs: &PromptInputs<'_>) -> String {
        let mut prompt = format!(
            "{SYSTEM_PROMPT_INTRO}\n\nThe vault contains {} {}.",
            inputs.note_count,
            if inputs.note_count == 1 { "note" } else { "notes" }
        );

        if !inputs.tags.is_empty() {
            let shown: Vec<String> = inputs
                .tags
                .iter()
                .take(MAX_PROMPT_TAGS)
                .map(|t| format!("#{t}"))
                .collect();
            prompt.push_str(&format!("\nExisting tags: {}", shown.join(", ")));
            if inputs.tags.len() > MAX_PROMPT_TAGS {
                prompt.push_str(&format!(
                    " (and {} more)",
                    inputs.tags.len() - MAX_PROMPT_TAGS
                ));
            }
            prompt.push_str(". Prefer existing tags when tagging notes.");
        }

        prompt.push_str("\n\n");
        prompt.push_str(SYSTEM_PROMPT_RULES);

        if let Some(context) = inputs.note_context.map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str("\n\nContext from the user's notes:\n");
            prompt.push_str(context);
        }

        prompt
    }
}
