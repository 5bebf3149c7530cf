//! Side-effect tracking: which notes did this conversation create?
//!
//! Tools report created notes directly through [`ToolOutput::created`].
//! When a successful `create_note` call comes back without a location (a
//! third-party tool, or a store that cannot report one), the tracker falls
//! back to listing the notes directory and taking the newest note file.
//! The fallback is best-effort: a concurrent external write to the same
//! directory can make it pick the wrong file.

use std::path::{Path, PathBuf};

use crate::tools::store::{is_note_file, NoteStore};

use super::types::ToolOutput;

const CREATE_TOOL: &str = "create_note";

/// Accumulates created-note locations across rounds, in creation order.
#[derive(Debug, Default)]
pub struct SideEffectTracker {
    created: Vec<PathBuf>,
}

impl SideEffectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the effects of one executed tool call.
    pub async fn record(&mut self, output: &ToolOutput, store: &dyn NoteStore, notes_dir: &Path) {
        if output.is_error {
            return;
        }

        if let Some(path) = &output.created {
            self.push(path.clone());
            return;
        }

        if output.tool_name == CREATE_TOOL {
            match newest_note_in(store, notes_dir).await {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "created note located by directory scan");
                    self.push(path);
                }
                None => tracing::warn!(
                    dir = %notes_dir.display(),
                    "note creation succeeded but no note file was found"
                ),
            }
        }
    }

    fn push(&mut self, path: PathBuf) {
        if !self.created.contains(&path) {
            self.created.push(path);
        }
    }

    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }

    pub fn into_created(self) -> Vec<PathBuf> {
        self.created
    }
}

/// Newest note file in `dir`: entries sorted by file name descending, first
/// one with the note extension.
pub async fn newest_note_in(store: &dyn NoteStore, dir: &Path) -> Option<PathBuf> {
    let mut entries = match store.list_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to list notes directory");
            return None;
        }
    };

    entries.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    entries.into_iter().find(|p| is_note_file(p))
}
