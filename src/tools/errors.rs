//! Tool and storage error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by a [`NoteStore`](super::store::NoteStore).
#[derive(Debug, Error)]
pub enum NoteStoreError {
    #[error("note not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("storage I/O error at {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    #[error("malformed note: {reason}")]
    Format { reason: String },
}

impl NoteStoreError {
    pub(crate) fn io(path: &Path, err: &std::io::Error) -> Self {
        NoteStoreError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// Errors a tool call can end with. The executor turns these into an
/// error payload for the model; they never abort the conversation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model called a tool that is not registered.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// Two tools with the same name were registered.
    #[error("duplicate tool name: {name}")]
    DuplicateTool { name: String },

    /// Arguments are missing or have the wrong shape.
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// No note matched the requested title.
    #[error("no note titled '{title}'")]
    NoteNotFound { title: String },

    /// The tool needs context that the caller did not provide.
    #[error("{reason}")]
    Unavailable { reason: String },

    #[error(transparent)]
    Storage(#[from] NoteStoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_converts() {
        let err: ToolError = NoteStoreError::NotFound {
            path: PathBuf::from("/n/a.md"),
        }
        .into();
        assert_eq!(err.to_string(), "note not found: /n/a.md");
    }
}
