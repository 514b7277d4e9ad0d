//! One-level directory listing for interactive browsing
//!
//! A browser expands folders on demand, so `list_directory` returns a node
//! with its immediate children only. Each node carries the exclusion verdict
//! that would apply to it, letting a UI show excluded entries as disabled.

use std::path::Path;

use serde::Serialize;

use crate::exclusion::{ExclusionRuleSet, ExclusionVerdict, classify};
use crate::selection::{EntryKind, FsEntry, ListError, list_children};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListingNode {
    Folder {
        id: String,
        text: String,
        excluded_info: Option<ExclusionVerdict>,
        /// Whether the folder has entries to expand
        has_children: bool,
        children: Vec<ListingNode>,
    },
    File {
        id: String,
        text: String,
        excluded_info: Option<ExclusionVerdict>,
    },
    Error {
        id: String,
        text: String,
    },
}

impl ListingNode {
    pub fn id(&self) -> &str {
        match self {
            ListingNode::Folder { id, .. } => id,
            ListingNode::File { id, .. } => id,
            ListingNode::Error { id, .. } => id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ListingNode::Folder { text, .. } => text,
            ListingNode::File { text, .. } => text,
            ListingNode::Error { text, .. } => text,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ListingNode::Folder { .. })
    }
}

/// List `path` with its immediate children.
pub fn list_directory(path: &Path, rules: &ExclusionRuleSet) -> ListingNode {
    let entry = FsEntry::resolve(path);
    match entry.kind() {
        EntryKind::Missing => ListingNode::Error {
            id: entry.listed_path().display().to_string(),
            text: format!("{} (Not Found)", entry.name()),
        },
        EntryKind::File => shallow_node(&entry, rules),
        EntryKind::Directory => {
            let children = match list_children(entry.label_path()) {
                Ok(children) => children.iter().map(|c| shallow_node(c, rules)).collect(),
                Err(ListError::PermissionDenied { .. }) => vec![ListingNode::Error {
                    id: format!("{}/permission_error", entry.listed_path().display()),
                    text: "[Permission Denied]".to_string(),
                }],
                Err(e) => {
                    tracing::warn!(error = %e, "cannot list directory");
                    vec![ListingNode::Error {
                        id: format!("{}/error", entry.listed_path().display()),
                        text: format!("[{}]", e),
                    }]
                }
            };
            ListingNode::Folder {
                id: entry.listed_path().display().to_string(),
                text: entry.name(),
                excluded_info: classify(&entry, rules),
                has_children: !children.is_empty(),
                children,
            }
        }
    }
}

/// A node without expanded children.
fn shallow_node(entry: &FsEntry, rules: &ExclusionRuleSet) -> ListingNode {
    let id = entry.listed_path().display().to_string();
    let text = entry.name();
    let excluded_info = classify(entry, rules);

    if entry.is_dir() {
        ListingNode::Folder {
            id,
            text,
            excluded_info,
            has_children: has_entries(entry.path()),
            children: Vec::new(),
        }
    } else {
        ListingNode::File {
            id,
            text,
            excluded_info,
        }
    }
}

fn has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
