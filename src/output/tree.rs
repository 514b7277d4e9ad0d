//! Structure header rendering
//!
//! `TreeRenderer` places every structure entry in a name tree relative to the
//! entries' common ancestor and draws it with `tree(1)` style glyphs.

use std::path::{Component, Path, PathBuf};

use crate::selection::FsEntry;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const SPACE_INDENT: &str = "    ";

/// Nested, insertion-ordered mapping of path components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTree {
    children: Vec<(String, NameTree)>,
}

impl NameTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path given as components, creating intermediate nodes.
    pub fn insert<I, S>(&mut self, parts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cursor = self;
        for part in parts {
            cursor = cursor.child_mut(part.into());
        }
    }

    fn child_mut(&mut self, name: String) -> &mut NameTree {
        let idx = match self.children.iter().position(|(n, _)| *n == name) {
            Some(idx) => idx,
            None => {
                self.children.push((name, NameTree::new()));
                self.children.len() - 1
            }
        };
        &mut self.children[idx].1
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Names at the top level, in insertion order.
    pub fn top_level(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(n, _)| n.as_str())
    }

    /// Draw the tree, one line per node, depth first.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.render_into(&mut lines, "");
        lines
    }

    fn render_into(&self, lines: &mut Vec<String>, prefix: &str) {
        for (i, (name, child)) in self.children.iter().enumerate() {
            let is_last = i == self.children.len() - 1;
            let connector = if is_last { LAST_BRANCH } else { BRANCH };
            lines.push(format!("{}{}{}", prefix, connector, name));

            if !child.is_empty() {
                let extension = if is_last { SPACE_INDENT } else { PIPE_INDENT };
                child.render_into(lines, &format!("{}{}", prefix, extension));
            }
        }
    }
}

/// Rendered structure of a selection.
#[derive(Debug, Clone)]
pub struct RenderedTree {
    pub common_ancestor: PathBuf,
    pub lines: Vec<String>,
    /// Root line naming the ancestor; `None` when the tree already starts with it.
    pub root_label: Option<String>,
}

impl RenderedTree {
    /// The "Structure of selected items" header, including its trailing blank line.
    pub fn header(&self) -> String {
        let mut out = String::from("Structure of selected items:\n");
        if let Some(label) = &self.root_label {
            out.push_str(label);
            out.push_str("/\n");
        }
        out.push_str(&self.lines.join("\n"));
        out.push_str("\n\n");
        out
    }
}

/// Builds the structure header for a set of entries.
pub struct TreeRenderer {
    fallback_dir: PathBuf,
}

impl TreeRenderer {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            fallback_dir: std::fs::canonicalize(&cwd).unwrap_or(cwd),
        }
    }

    /// Directory used as ancestor when entries share no root.
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn render(&self, entries: &[FsEntry]) -> RenderedTree {
        let ancestor = self.common_ancestor(entries);
        let ancestor_included = entries.iter().any(|e| e.label_path() == ancestor);
        let ancestor_name = display_name(&ancestor);

        let mut tree = NameTree::new();
        for entry in entries {
            tree.insert(relative_parts(entry, &ancestor, &ancestor_name, ancestor_included));
        }

        let mut top = tree.top_level();
        let single_top_is_ancestor = matches!(
            (top.next(), top.next()),
            (Some(name), None) if name == ancestor_name
        );

        RenderedTree {
            lines: tree.render_lines(),
            root_label: (!single_top_is_ancestor).then(|| ancestor_name.clone()),
            common_ancestor: ancestor,
        }
    }

    /// Deepest directory containing every entry.
    ///
    /// Falls back to the configured directory when the entries span unrelated
    /// roots, and promotes a file result to its parent.
    pub fn common_ancestor(&self, entries: &[FsEntry]) -> PathBuf {
        let ancestor = common_prefix(entries.iter().map(FsEntry::label_path))
            .unwrap_or_else(|| self.fallback_dir.clone());

        if ancestor.is_file() {
            if let Some(parent) = ancestor.parent() {
                return parent.to_path_buf();
            }
        }
        ancestor
    }
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest common component prefix, or `None` if the paths share no root.
fn common_prefix<'a>(mut paths: impl Iterator<Item = &'a Path>) -> Option<PathBuf> {
    let first = paths.next()?;
    let mut common: Vec<Component<'a>> = first.components().collect();

    for path in paths {
        let shared = common
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }

    match common.first() {
        Some(Component::Prefix(_)) | Some(Component::RootDir) => {
            Some(common.iter().map(|c| c.as_os_str()).collect())
        }
        _ => None,
    }
}

/// Base name of `path`, or the whole path when it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn relative_parts(
    entry: &FsEntry,
    ancestor: &Path,
    ancestor_name: &str,
    ancestor_included: bool,
) -> Vec<String> {
    if entry.label_path() == ancestor {
        return vec![entry.name()];
    }

    match entry.label_path().strip_prefix(ancestor) {
        Ok(rel) => {
            let mut parts = Vec::new();
            if ancestor_included {
                parts.push(ancestor_name.to_string());
            }
            parts.extend(rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()));
            parts
        }
        // Disjoint roots: show the bare name, even if it collides with another
        Err(_) => vec![entry.name()],
    }
}
