//! Exclusion-aware expansion of a user selection
//!
//! `SelectionExpander` turns raw path strings into an `IncludedSet`. The walk
//! is an explicit FIFO worklist with a visited set keyed on resolved paths, so
//! deep trees never hit recursion limits and symlink cycles terminate.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::entry::{FsEntry, ListError, list_children};
use crate::exclusion::{ExclusionRuleSet, ExclusionVerdict, classify};

/// Everything that survived exclusion and traversal.
#[derive(Debug, Default)]
pub struct IncludedSet {
    structure: Vec<FsEntry>,
    content: Vec<FsEntry>,
    excluded: Vec<(PathBuf, ExclusionVerdict)>,
    excluded_paths: HashSet<PathBuf>,
    missing: Vec<String>,
}

impl IncludedSet {
    /// All included files and directories, ordered by lowercased path.
    pub fn structure_entries(&self) -> &[FsEntry] {
        &self.structure
    }

    /// Included files only, in the same order as `structure_entries`.
    pub fn content_files(&self) -> &[FsEntry] {
        &self.content
    }

    /// Entries dropped by a rule, in the order they were met.
    pub fn excluded(&self) -> &[(PathBuf, ExclusionVerdict)] {
        &self.excluded
    }

    /// Raw inputs that did not resolve to an existing entry.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
    }

    /// Record a verdict once per resolved path.
    fn record_excluded(&mut self, path: &Path, verdict: ExclusionVerdict) {
        if self.excluded_paths.insert(path.to_path_buf()) {
            self.excluded.push((path.to_path_buf(), verdict));
        }
    }
}

/// Expands selections against a fixed rule set.
pub struct SelectionExpander<'a> {
    rules: &'a ExclusionRuleSet,
    base_dir: PathBuf,
}

impl<'a> SelectionExpander<'a> {
    pub fn new(rules: &'a ExclusionRuleSet) -> Self {
        Self {
            rules,
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Directory that relative selections are resolved against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn expand<S: AsRef<str>>(&self, raw_paths: &[S]) -> IncludedSet {
        let mut set = IncludedSet::default();
        let initial = self.initial_nodes(raw_paths, &mut set);
        let initial_paths: HashSet<PathBuf> =
            initial.iter().map(|e| e.path().to_path_buf()).collect();

        let mut queue: VecDeque<FsEntry> = initial.into_iter().collect();
        let mut visited: HashSet<PathBuf> = HashSet::new();

        while let Some(entry) = queue.pop_front() {
            if visited.contains(entry.path()) {
                continue;
            }

            if !initial_paths.contains(entry.path()) {
                if let Some(verdict) = classify(&entry, self.rules) {
                    tracing::debug!(path = %entry.path().display(), %verdict, "excluded");
                    set.record_excluded(entry.path(), verdict);
                    continue;
                }
            }

            visited.insert(entry.path().to_path_buf());
            if entry.is_dir() {
                queue.extend(self.children_of(entry.label_path()));
            } else {
                set.content.push(entry.clone());
            }
            set.structure.push(entry);
        }

        set.structure.sort_by(FsEntry::cmp_by_path);
        set.content.sort_by(FsEntry::cmp_by_path);
        tracing::info!(
            entries = set.structure.len(),
            files = set.content.len(),
            excluded = set.excluded.len(),
            "selection expanded"
        );
        set
    }

    /// Resolve raw inputs, dropping missing ones and ones excluded outright.
    fn initial_nodes<S: AsRef<str>>(&self, raw_paths: &[S], set: &mut IncludedSet) -> Vec<FsEntry> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();

        for raw in raw_paths {
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                tracing::warn!("ignoring empty path in selection");
                continue;
            }

            let entry = FsEntry::resolve_from(Path::new(raw), &self.base_dir);
            if !entry.exists() {
                tracing::warn!(path = raw, "selected path does not exist, skipping");
                set.missing.push(raw.to_string());
                continue;
            }

            if let Some(verdict) = classify(&entry, self.rules) {
                tracing::debug!(path = raw, %verdict, "selected path is excluded");
                set.record_excluded(entry.path(), verdict);
                continue;
            }

            if seen.insert(entry.path().to_path_buf()) {
                nodes.push(entry);
            }
        }

        nodes
    }

    fn children_of(&self, dir: &Path) -> Vec<FsEntry> {
        match list_children(dir) {
            Ok(children) => children,
            Err(e @ ListError::PermissionDenied { .. }) => {
                tracing::warn!("{e}, treating as empty");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("{e}, skipping directory contents");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTree;

    fn names(entries: &[FsEntry], root: &Path) -> Vec<String> {
        let root = std::fs::canonicalize(root).unwrap();
        entries
            .iter()
            .map(|e| {
                e.path()
                    .strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    fn path_str(tree: &TestTree, rel: &str) -> String {
        tree.path().join(rel).to_string_lossy().to_string()
    }

    #[test]
    fn test_expand_directory() {
        let tree = TestTree::new();
        tree.add_file("proj/a.py", "print('a')");
        tree.add_file("proj/sub/b.py", "print('b')");
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules).expand(&[path_str(&tree, "proj")]);
        assert_eq!(
            names(set.structure_entries(), tree.path()),
            vec!["proj", "proj/a.py", "proj/sub", "proj/sub/b.py"]
        );
        assert_eq!(
            names(set.content_files(), tree.path()),
            vec!["proj/a.py", "proj/sub/b.py"]
        );
    }

    #[test]
    fn test_content_files_subset_of_structure() {
        let tree = TestTree::new();
        tree.add_file("x/one.txt", "1");
        tree.add_file("x/y/two.txt", "2");
        tree.add_dir("x/empty");
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules).expand(&[path_str(&tree, "x")]);
        for file in set.content_files() {
            assert!(file.is_file());
            assert!(set.structure_entries().contains(file));
        }
        assert_eq!(set.content_files().len(), 2);
    }

    #[test]
    fn test_excluded_subdirectory_is_pruned() {
        let tree = TestTree::new();
        tree.add_file("proj/a.py", "a");
        tree.add_file("proj/.git/config", "[core]");
        tree.add_file("proj/node_modules/pkg/deep/index.js", "x");
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules).expand(&[path_str(&tree, "proj")]);
        assert_eq!(names(set.structure_entries(), tree.path()), vec!["proj", "proj/a.py"]);
        let excluded: Vec<_> = set.excluded().iter().map(|(_, v)| v.rule.as_str()).collect();
        assert_eq!(excluded, vec![".git", "node_modules"]);
    }

    #[test]
    fn test_directly_selected_excluded_entries_are_dropped() {
        let tree = TestTree::new();
        tree.add_file("proj/.env", "SECRET=1");
        tree.add_file("proj/node_modules/x.js", "x");
        tree.add_file("proj/main.rs", "fn main() {}");
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules).expand(&[
            path_str(&tree, "proj/.env"),
            path_str(&tree, "proj/node_modules"),
            path_str(&tree, "proj/main.rs"),
        ]);
        assert_eq!(names(set.structure_entries(), tree.path()), vec!["proj/main.rs"]);
        assert_eq!(set.excluded().len(), 2);
    }

    #[test]
    fn test_selection_inside_dropped_selection_is_kept() {
        let tree = TestTree::new();
        tree.add_file("proj/build/app.js", "app");
        let rules = ExclusionRuleSet::default();

        // `build` is dropped, but the file selected beneath it survives on its own
        let set = SelectionExpander::new(&rules).expand(&[
            path_str(&tree, "proj/build"),
            path_str(&tree, "proj/build/app.js"),
        ]);
        assert_eq!(names(set.content_files(), tree.path()), vec!["proj/build/app.js"]);
    }

    #[test]
    fn test_initial_nodes_are_not_reexcluded() {
        let tree = TestTree::new();
        tree.add_file("proj/build/app.js", "app");
        tree.add_file("proj/lib.rs", "lib");
        let rules = ExclusionRuleSet::default();

        // `app.js` is selected directly and also sits under an excluded dir of `proj`
        let set = SelectionExpander::new(&rules).expand(&[
            path_str(&tree, "proj"),
            path_str(&tree, "proj/build/app.js"),
        ]);
        assert_eq!(
            names(set.content_files(), tree.path()),
            vec!["proj/build/app.js", "proj/lib.rs"]
        );
    }

    #[test]
    fn test_excluded_entry_reported_once() {
        let tree = TestTree::new();
        tree.add_file("proj/main.rs", "fn main() {}");
        tree.add_file("proj/app.log", "log");
        let rules = ExclusionRuleSet::default();

        // app.log is dropped as a selection and met again below proj
        let set = SelectionExpander::new(&rules).expand(&[
            path_str(&tree, "proj"),
            path_str(&tree, "proj/app.log"),
        ]);
        assert_eq!(set.excluded().len(), 1);
        assert_eq!(set.excluded()[0].1.rule, "*.log");
        assert_eq!(names(set.content_files(), tree.path()), vec!["proj/main.rs"]);
    }

    #[test]
    fn test_missing_and_duplicate_inputs() {
        let tree = TestTree::new();
        tree.add_file("a.txt", "a");
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules).expand(&[
            path_str(&tree, "a.txt"),
            path_str(&tree, "missing.txt"),
            path_str(&tree, "./a.txt"),
            String::new(),
        ]);
        assert_eq!(set.content_files().len(), 1);
        assert_eq!(set.missing().len(), 1);
    }

    #[test]
    fn test_relative_paths_use_base_dir() {
        let tree = TestTree::new();
        tree.add_file("src/lib.rs", "pub fn x() {}");
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules)
            .with_base_dir(tree.path())
            .expand(&["src/lib.rs"]);
        assert_eq!(names(set.content_files(), tree.path()), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_overlapping_selections_visit_once() {
        let tree = TestTree::new();
        tree.add_file("proj/sub/a.txt", "a");
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules).expand(&[
            path_str(&tree, "proj"),
            path_str(&tree, "proj/sub"),
            path_str(&tree, "proj/sub/a.txt"),
        ]);
        assert_eq!(
            names(set.structure_entries(), tree.path()),
            vec!["proj", "proj/sub", "proj/sub/a.txt"]
        );
    }

    #[test]
    fn test_empty_input() {
        let rules = ExclusionRuleSet::default();
        let set = SelectionExpander::new(&rules).expand::<&str>(&[]);
        assert!(set.is_empty());
        assert!(set.content_files().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let tree = TestTree::new();
        tree.add_file("proj/sub/a.txt", "a");
        std::os::unix::fs::symlink("..", tree.path().join("proj/sub/up")).unwrap();
        let rules = ExclusionRuleSet::default();

        let set = SelectionExpander::new(&rules).expand(&[path_str(&tree, "proj")]);
        assert_eq!(
            names(set.structure_entries(), tree.path()),
            vec!["proj", "proj/sub", "proj/sub/a.txt"]
        );
    }
}
