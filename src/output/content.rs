//! File content assembly
//!
//! `ContentAssembler` concatenates the included files into labeled blocks.
//! A file that cannot be read or decoded becomes an inline marker; it never
//! aborts the rest of the document.

use std::path::Path;

use crate::file_utils::{BinaryPolicy, ReadError, read_text_file};
use crate::selection::FsEntry;

/// Marker emitted in place of non-text content under `BinaryPolicy::Skip`.
pub const BINARY_MARKER: &str = "[binary file skipped]";

pub struct ContentAssembler {
    policy: BinaryPolicy,
}

impl ContentAssembler {
    pub fn new(policy: BinaryPolicy) -> Self {
        Self { policy }
    }

    /// One block per file: a `# File:` label, the content or a marker, and a
    /// blank separator line.
    pub fn assemble(&self, files: &[FsEntry], common_ancestor: &Path) -> String {
        let mut out = String::new();
        for file in files {
            out.push_str(&self.block(file, common_ancestor));
        }
        out
    }

    fn block(&self, file: &FsEntry, common_ancestor: &Path) -> String {
        let shown = if file.label_path().starts_with(common_ancestor) {
            file.label_path()
        } else {
            file.path()
        };
        let display = display_path(shown, common_ancestor);
        let body = match read_text_file(file.path(), self.policy) {
            Ok(content) => content,
            Err(ReadError::Decode { .. }) => {
                tracing::debug!(path = %file.path().display(), "binary file skipped");
                BINARY_MARKER.to_string()
            }
            Err(e @ ReadError::Io { .. }) => {
                tracing::warn!(path = %file.path().display(), error = %e, "cannot read file");
                format!("[Error reading file: {}]", e)
            }
        };
        format!("# File: {}\n{}\n\n", display, body)
    }
}

impl Default for ContentAssembler {
    fn default() -> Self {
        Self::new(BinaryPolicy::default())
    }
}

/// Path shown in a block label: relative to the ancestor when possible,
/// otherwise `.../parent/name` or just the name.
pub fn display_path(path: &Path, common_ancestor: &Path) -> String {
    if let Ok(rel) = path.strip_prefix(common_ancestor) {
        if !rel.as_os_str().is_empty() {
            return rel.display().to_string();
        }
    }

    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    match path.parent().and_then(Path::file_name) {
        Some(parent) => format!(".../{}/{}", parent.to_string_lossy(), name),
        None => name,
    }
}
