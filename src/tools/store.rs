//! Note storage contract and a filesystem implementation.
//!
//! The conversation engine only talks to storage through [`NoteStore`].
//! [`FsNoteStore`] keeps one markdown file per note with a small YAML
//! header; file names start with a millisecond timestamp so that sorting
//! names in descending order lists the newest note first.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::NoteStoreError;

/// Extension of note files.
pub const NOTE_EXTENSION: &str = "md";

/// A note as read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip)]
    pub body: String,
}

/// Input for creating a note.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// Storage primitives the note tools are built on.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Create a note in `dir` and return its location.
    async fn create(&self, dir: &Path, draft: &NoteDraft) -> Result<PathBuf, NoteStoreError>;

    async fn read(&self, path: &Path) -> Result<Note, NoteStoreError>;

    /// Replace the body, keeping title and tags.
    async fn write_body(&self, path: &Path, body: &str) -> Result<(), NoteStoreError>;

    /// Change the title. Returns the (possibly new) location.
    async fn rename(&self, path: &Path, new_title: &str) -> Result<PathBuf, NoteStoreError>;

    async fn delete(&self, path: &Path) -> Result<(), NoteStoreError>;

    /// List entries of a directory (files only, unsorted).
    async fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, NoteStoreError>;
}

/// Whether a path has the note extension.
pub fn is_note_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(NOTE_EXTENSION)
}

// ─── FsNoteStore ─────────────────────────────────────────────────────────────

/// Markdown-on-disk note storage.
#[derive(Debug, Clone, Default)]
pub struct FsNoteStore;

impl FsNoteStore {
    pub fn new() -> Self {
        Self
    }

    /// Time-ordered unique file name: `YYYYMMDDHHMMSSmmm-xxxxxx.md`.
    fn new_file_name() -> String {
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{stamp}-{}.{NOTE_EXTENSION}", &suffix[..6])
    }

    async fn write_note(path: &Path, note: &Note) -> Result<(), NoteStoreError> {
        let text = render_note(note)?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| NoteStoreError::io(path, &e))
    }
}

#[async_trait]
impl NoteStore for FsNoteStore {
    async fn create(&self, dir: &Path, draft: &NoteDraft) -> Result<PathBuf, NoteStoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| NoteStoreError::io(dir, &e))?;

        let path = dir.join(Self::new_file_name());
        let note = Note {
            title: draft.title.clone(),
            tags: draft.tags.clone(),
            body: draft.body.clone(),
        };
        Self::write_note(&path, &note).await?;

        tracing::debug!(path = %path.display(), title = %draft.title, "created note");
        Ok(path)
    }

    async fn read(&self, path: &Path) -> Result<Note, NoteStoreError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NoteStoreError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                NoteStoreError::io(path, &e)
            }
        })?;
        parse_note(&text, path)
    }

    async fn write_body(&self, path: &Path, body: &str) -> Result<(), NoteStoreError> {
        let mut note = self.read(path).await?;
        note.body = body.to_string();
        Self::write_note(path, &note).await
    }

    async fn rename(&self, path: &Path, new_title: &str) -> Result<PathBuf, NoteStoreError> {
        let mut note = self.read(path).await?;
        note.title = new_title.to_string();
        Self::write_note(path, &note).await?;
        Ok(path.to_path_buf())
    }

    async fn delete(&self, path: &Path) -> Result<(), NoteStoreError> {
        tokio::fs::remove_file(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NoteStoreError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                NoteStoreError::io(path, &e)
            }
        })
    }

    async fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, NoteStoreError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| NoteStoreError::io(dir, &e))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| NoteStoreError::io(dir, &e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }
}

// ─── Encoding ────────────────────────────────────────────────────────────────

fn render_note(note: &Note) -> Result<String, NoteStoreError> {
    let header = serde_yaml::to_string(note).map_err(|e| NoteStoreError::Format {
        reason: e.to_string(),
    })?;
    Ok(format!("---\n{header}---\n{}", note.body))
}

fn parse_note(text: &str, path: &Path) -> Result<Note, NoteStoreError> {
    let Some(rest) = text.strip_prefix("---\n") else {
        // Plain markdown without a header: title falls back to the file stem.
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(Note {
            title,
            tags: Vec::new(),
            body: text.to_string(),
        });
    };

    let (header, body) = match rest.find("\n---\n") {
        Some(idx) => (&rest[..idx], &rest[idx + 5..]),
        None => match rest.strip_prefix("---\n") {
            Some(body) => ("", body),
            None => {
                return Err(NoteStoreError::Format {
                    reason: format!("unterminated header in {}", path.display()),
                })
            }
        },
    };

    let mut note: Note = serde_yaml::from_str(header).map_err(|e| NoteStoreError::Format {
        reason: format!("{}: {e}", path.display()),
    })?;
    note.body = body.to_string();
    Ok(note)
}
