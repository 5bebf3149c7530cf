//! Read-only snapshot of the user's notes taken when a chat request starts.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata of one note in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMeta {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub path: PathBuf,
}

/// Snapshot handed to the tools and the system-prompt builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolContext {
    pub notes: Vec<NoteMeta>,
    /// Note currently selected in the sidebar.
    pub selected_note: Option<PathBuf>,
    /// Unsaved text of the open editor, if any.
    pub editor_text: Option<String>,
    /// Directory new notes are created in.
    pub root_dir: PathBuf,
}

impl ToolContext {
    /// Find a note by title (case-insensitive, surrounding whitespace ignored).
    pub fn find_by_title(&self, title: &str) -> Option<&NoteMeta> {
        let wanted = title.trim();
        self.notes
            .iter()
            .find(|n| n.title.trim().eq_ignore_ascii_case(wanted))
    }

    /// Every tag with the number of notes carrying it, sorted by tag.
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for note in &self.notes {
            for tag in &note.tags {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Distinct tags, sorted.
    pub fn known_tags(&self) -> Vec<String> {
        self.tag_counts().into_keys().collect()
    }

    /// The selected note's metadata, when it is part of the snapshot.
    pub fn selected_meta(&self) -> Option<&NoteMeta> {
        let selected = self.selected_note.as_ref()?;
        self.notes.iter().find(|n| &n.path == selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext {
            notes: vec![
                NoteMeta {
                    title: "Groceries".into(),
                    tags: vec!["home".into(), "lists".into()],
                    path: "/n/1.md".into(),
                },
                NoteMeta {
                    title: "Trip plan".into(),
                    tags: vec!["lists".into()],
                    path: "/n/2.md".into(),
                },
            ],
            selected_note: Some("/n/2.md".into()),
            editor_text: None,
            root_dir: "/n".into(),
        }
    }

    #[test]
    fn test_find_by_title_case_insensitive() {
        assert_eq!(
            ctx().find_by_title("  groceries ").map(|n| n.path.clone()),
            Some(PathBuf::from("/n/1.md"))
        );
        assert!(ctx().find_by_title("Missing").is_none());
    }

    #[test]
    fn test_tag_counts() {
        let counts = ctx().tag_counts();
        assert_eq!(counts.get("lists"), Some(&2));
        assert_eq!(counts.get("home"), Some(&1));
        assert_eq!(ctx().known_tags(), vec!["home", "lists"]);
    }

    #[test]
    fn test_selected_meta() {
        assert_eq!(ctx().selected_meta().unwrap().title, "Trip plan");
    }
}
