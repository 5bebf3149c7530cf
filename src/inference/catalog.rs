//! Static model catalog.
//!
//! Membership in these tables decides which backend serves a model
//! identifier. Anything not listed here is sent to the OpenRouter backend,
//! which accepts `vendor/model` identifiers.

/// Anthropic models addressed by their exact API name.
pub const ANTHROPIC_MODELS: &[&str] = &[
    "claude-opus-4-1-20250805",
    "claude-opus-4-20250514",
    "claude-sonnet-4-5-20250929",
    "claude-sonnet-4-20250514",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-haiku-20241022",
    "claude-haiku-4-5-20251001",
];

/// Alias strings accepted for Anthropic models, paired with the canonical
/// API name they resolve to.
pub const ANTHROPIC_ALIASES: &[(&str, &str)] = &[
    ("claude-opus-4-1", "claude-opus-4-1-20250805"),
    ("claude-opus-4-0", "claude-opus-4-20250514"),
    ("claude-sonnet-4-5", "claude-sonnet-4-5-20250929"),
    ("claude-sonnet-4-0", "claude-sonnet-4-20250514"),
    ("claude-3-7-sonnet-latest", "claude-3-7-sonnet-20250219"),
    ("claude-3-5-haiku-latest", "claude-3-5-haiku-20241022"),
    ("claude-haiku-4-5", "claude-haiku-4-5-20251001"),
];

/// OpenAI models addressed by their exact API name.
pub const OPENAI_MODELS: &[&str] = &[
    "gpt-5",
    "gpt-5-mini",
    "gpt-5-nano",
    "gpt-4.1",
    "gpt-4.1-mini",
    "gpt-4.1-nano",
    "gpt-4o",
    "gpt-4o-mini",
    "o3",
    "o3-mini",
    "o4-mini",
];

/// Whether the identifier is an Anthropic model name or alias.
pub fn is_anthropic_model(model: &str) -> bool {
    ANTHROPIC_MODELS.contains(&model) || ANTHROPIC_ALIASES.iter().any(|(alias, _)| *alias == model)
}

/// Whether the identifier is an OpenAI model name.
pub fn is_openai_model(model: &str) -> bool {
    OPENAI_MODELS.contains(&model)
}

/// Whether an OpenAI model is a reasoning model (o-series, GPT-5 family).
///
/// These reject `max_tokens` and any non-default `temperature`; requests
/// carry `max_completion_tokens` instead.
pub fn is_openai_reasoning_model(model: &str) -> bool {
    if model.starts_with("gpt-5") {
        return true;
    }
    let mut chars = model.chars();
    chars.next() == Some('o') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Resolve an Anthropic alias to its canonical API name.
///
/// Exact names and unknown strings are returned unchanged.
pub fn canonical_anthropic_model(model: &str) -> &str {
    ANTHROPIC_ALIASES
        .iter()
        .find(|(alias, _)| *alias == model)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(model)
}
