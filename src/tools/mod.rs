//! Note tools the model can call.
//!
//! Submodules:
//! - `registry`: ordered, name-keyed tool collection with argument validation
//! - `notes`: the ten concrete note tools
//! - `store`: storage contract (`NoteStore`) and the filesystem implementation
//! - `context`: read-only snapshot of the user's notes
//! - `errors`: tool and storage error types

pub mod context;
pub mod errors;
pub mod notes;
pub mod registry;
pub mod store;

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

pub use context::{NoteMeta, ToolContext};
pub use errors::{NoteStoreError, ToolError};
pub use notes::{note_tools, ToolEnv};
pub use registry::ToolRegistry;
pub use store::{FsNoteStore, Note, NoteDraft, NoteStore};

/// What a tool hands back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReply {
    /// Text shown to the model (usually JSON).
    pub content: String,
    /// Location of a note the call created, if any.
    pub created: Option<PathBuf>,
}

impl ToolReply {
    pub fn json(value: &Value) -> Self {
        Self {
            content: value.to_string(),
            created: None,
        }
    }

    pub fn with_created(mut self, path: PathBuf) -> Self {
        self.created = Some(path);
        self
    }
}

/// A tool the model can invoke by name.
#[async_trait]
pub trait NoteTool: Send + Sync {
    /// Unique dispatch name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError>;
}
