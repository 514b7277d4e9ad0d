//! Resolved filesystem entries and the directory-listing collaborator

use std::cmp::Ordering;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// What a resolved path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// Does not exist, or is something we never read (sockets, devices, fifos)
    Missing,
}

/// An absolute, resolved path plus its kind.
///
/// Identity is the resolved path: two spellings of the same node (relative vs
/// absolute, or a symlink and its target) compare equal. The name comes from
/// the path as it was listed, so a symlink keeps its own name.
#[derive(Debug, Clone)]
pub struct FsEntry {
    path: PathBuf,
    listed: PathBuf,
    kind: EntryKind,
}

impl FsEntry {
    /// Resolve `path`, following symlinks. Relative paths are taken against the
    /// current directory.
    pub fn resolve(path: &Path) -> Self {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::resolve_from(path, &base)
    }

    /// Resolve `path`, taking relative paths against `base`.
    ///
    /// The listed path keeps the final component as written but has its
    /// parent resolved, so `a/../b/.env` lists as `<base>/b/.env`.
    pub fn resolve_from(path: &Path, base: &Path) -> Self {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };

        let listed = match (joined.parent(), joined.file_name()) {
            (Some(parent), Some(name)) => fs::canonicalize(parent)
                .map(|p| p.join(name))
                .unwrap_or_else(|_| joined.clone()),
            _ => fs::canonicalize(&joined).unwrap_or_else(|_| joined.clone()),
        };
        Self::from_listed(listed)
    }

    /// Resolve an entry whose listed path is already final.
    fn from_listed(listed: PathBuf) -> Self {
        match fs::canonicalize(&listed) {
            Ok(resolved) => {
                let kind = match fs::metadata(&resolved) {
                    Ok(meta) if meta.is_dir() => EntryKind::Directory,
                    Ok(meta) if meta.is_file() => EntryKind::File,
                    _ => EntryKind::Missing,
                };
                Self {
                    path: resolved,
                    listed,
                    kind,
                }
            }
            Err(_) => Self {
                path: listed.clone(),
                listed,
                kind: EntryKind::Missing,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as given or listed, before following symlinks.
    pub fn listed_path(&self) -> &Path {
        &self.listed
    }

    /// Path to show in output: the listed path when it is already normal,
    /// the resolved one when it still has `.` or `..` parts.
    pub fn label_path(&self) -> &Path {
        let normal = self.listed.components().all(|c| {
            matches!(
                c,
                Component::Prefix(_) | Component::RootDir | Component::Normal(_)
            )
        });
        if normal { &self.listed } else { &self.path }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn exists(&self) -> bool {
        self.kind != EntryKind::Missing
    }

    /// Base name as listed, or the whole path for roots like `/`.
    pub fn name(&self) -> String {
        self.listed
            .file_name()
            .or_else(|| self.path.file_name())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Ordering used for structure and content output: lowercased full path,
    /// then the exact path so distinct entries never tie.
    pub fn cmp_by_path(&self, other: &Self) -> Ordering {
        let a = self.label_path().to_string_lossy().to_lowercase();
        let b = other.label_path().to_string_lossy().to_lowercase();
        a.cmp(&b)
            .then_with(|| self.label_path().cmp(other.label_path()))
            .then_with(|| self.path.cmp(&other.path))
    }

    /// Ordering used for siblings: directories first, then lowercased name.
    pub fn cmp_as_sibling(&self, other: &Self) -> Ordering {
        (!self.is_dir())
            .cmp(&!other.is_dir())
            .then_with(|| self.name().to_lowercase().cmp(&other.name().to_lowercase()))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialEq for FsEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FsEntry {}

impl Hash for FsEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error("permission denied listing '{}'", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("cannot list '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Immediate children of `dir`, resolved and sorted directories-first.
///
/// Each child is listed under `dir` as given, so children of a symlinked
/// directory keep the link in their listed path.
///
/// Children that vanish or cannot be resolved (broken symlinks) are dropped.
pub fn list_children(dir: &Path) -> Result<Vec<FsEntry>, ListError> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => ListError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => ListError::Io {
            path: dir.to_path_buf(),
            source: e,
        },
    })?;

    let mut children: Vec<FsEntry> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let child = FsEntry::from_listed(dir.join(e.file_name()));
            if child.exists() {
                Some(child)
            } else {
                tracing::debug!(path = %e.path().display(), "skipping unresolvable entry");
                None
            }
        })
        .collect();
    children.sort_by(FsEntry::cmp_as_sibling);
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_kinds() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        assert_eq!(FsEntry::resolve(&dir.path().join("a.txt")).kind(), EntryKind::File);
        assert_eq!(FsEntry::resolve(&dir.path().join("sub")).kind(), EntryKind::Directory);
        assert_eq!(FsEntry::resolve(&dir.path().join("nope")).kind(), EntryKind::Missing);
    }

    #[test]
    fn test_relative_and_absolute_spellings_are_equal() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.txt"), "a").unwrap();

        let relative = FsEntry::resolve_from(Path::new("sub/../sub/a.txt"), dir.path());
        let absolute = FsEntry::resolve(&dir.path().join("sub").join("a.txt"));
        assert_eq!(relative, absolute);
        assert!(relative.path().is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_resolves_to_target() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("target.txt"), "t").unwrap();
        std::os::unix::fs::symlink(dir.path().join("target.txt"), dir.path().join("link.txt"))
            .unwrap();

        let link = FsEntry::resolve(&dir.path().join("link.txt"));
        let target = FsEntry::resolve(&dir.path().join("target.txt"));
        assert_eq!(link, target);
        assert_eq!(link.path(), target.path());
        assert_eq!(link.name(), "link.txt");
        assert_eq!(link.listed_path(), dir.path().join("link.txt"));
        assert_eq!(link.label_path(), dir.path().join("link.txt"));

        fs::create_dir(dir.path().join("x")).unwrap();
        let dotted = FsEntry::resolve(&dir.path().join("x/../target.txt"));
        assert!(dotted.is_file());
        assert_eq!(dotted.label_path(), dotted.path());
    }

    #[test]
    fn test_root_name_falls_back_to_full_path() {
        let root = FsEntry::resolve(Path::new("/"));
        assert!(!root.name().is_empty());
    }

    #[test]
    fn test_list_children_sorted_dirs_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("A.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("Alpha")).unwrap();

        let names: Vec<String> = list_children(dir.path())
            .unwrap()
            .iter()
            .map(FsEntry::name)
            .collect();
        assert_eq!(names, vec!["Alpha", "zeta", "A.txt", "b.txt"]);
    }

    #[test]
    fn test_list_children_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = list_children(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, ListError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_children_skips_broken_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.txt"), "r").unwrap();
        std::os::unix::fs::symlink("nowhere.txt", dir.path().join("broken.txt")).unwrap();

        let children = list_children(dir.path()).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "real.txt");
    }

    #[test]
    fn test_cmp_by_path_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("B.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let mut entries = vec![
            FsEntry::resolve(&dir.path().join("B.txt")),
            FsEntry::resolve(&dir.path().join("a.txt")),
        ];
        entries.sort_by(FsEntry::cmp_by_path);
        assert_eq!(entries[0].name(), "a.txt");
    }
}
