//! Exclusion verdicts for single filesystem entries

use std::fmt;

use serde::Serialize;

use super::rules::ExclusionRuleSet;
use crate::selection::{EntryKind, FsEntry};

/// Which kind of rule excluded an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExclusionKind {
    #[serde(rename = "Directory Name")]
    DirectoryName,
    #[serde(rename = "Directory Pattern")]
    DirectoryPattern,
    #[serde(rename = "File Name")]
    FileName,
    #[serde(rename = "File Pattern")]
    FilePattern,
}

impl fmt::Display for ExclusionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExclusionKind::DirectoryName => "Directory Name",
            ExclusionKind::DirectoryPattern => "Directory Pattern",
            ExclusionKind::FileName => "File Name",
            ExclusionKind::FilePattern => "File Pattern",
        };
        f.write_str(label)
    }
}

/// Why an entry was excluded: the kind of rule and the rule text that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionVerdict {
    #[serde(rename = "type")]
    pub kind: ExclusionKind,
    pub rule: String,
}

impl fmt::Display for ExclusionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.rule)
    }
}

/// Decide whether `entry` is excluded by `rules`.
///
/// Exact names are checked before patterns. Missing entries are never
/// excluded; callers deal with absence before asking.
pub fn classify(entry: &FsEntry, rules: &ExclusionRuleSet) -> Option<ExclusionVerdict> {
    let name = entry.name();
    let pattern_kind = match entry.kind() {
        EntryKind::Directory => {
            if rules.has_dir_name(&name) {
                return Some(ExclusionVerdict {
                    kind: ExclusionKind::DirectoryName,
                    rule: name,
                });
            }
            ExclusionKind::DirectoryPattern
        }
        EntryKind::File => {
            if rules.has_file_name(&name) {
                return Some(ExclusionVerdict {
                    kind: ExclusionKind::FileName,
                    rule: name,
                });
            }
            ExclusionKind::FilePattern
        }
        EntryKind::Missing => return None,
    };

    rules.matching_pattern(&name).map(|p| ExclusionVerdict {
        kind: pattern_kind,
        rule: p.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry(dir: &TempDir, rel: &str, is_dir: bool) -> FsEntry {
        let path = dir.path().join(rel);
        if is_dir {
            fs::create_dir_all(&path).unwrap();
        } else {
            fs::write(&path, "x").unwrap();
        }
        FsEntry::resolve(&path)
    }

    #[test]
    fn test_directory_name_rule() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRuleSet::default();
        let verdict = classify(&entry(&dir, "node_modules", true), &rules).unwrap();
        assert_eq!(verdict.kind, ExclusionKind::DirectoryName);
        assert_eq!(verdict.rule, "node_modules");
    }

    #[test]
    fn test_directory_pattern_rule() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRuleSet::default();
        let verdict = classify(&entry(&dir, "cache.tmp", true), &rules).unwrap();
        assert_eq!(verdict.kind, ExclusionKind::DirectoryPattern);
        assert_eq!(verdict.rule, "*.tmp");
    }

    #[test]
    fn test_file_rules() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRuleSet::default();

        let by_name = classify(&entry(&dir, ".DS_Store", false), &rules).unwrap();
        assert_eq!(by_name.kind, ExclusionKind::FileName);

        let by_pattern = classify(&entry(&dir, "server.log", false), &rules).unwrap();
        assert_eq!(by_pattern.kind, ExclusionKind::FilePattern);
        assert_eq!(by_pattern.to_string(), "File Pattern: *.log");

        assert!(classify(&entry(&dir, "main.rs", false), &rules).is_none());
    }

    #[test]
    fn test_dir_names_do_not_apply_to_files() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRuleSet::new(["build"], Vec::<String>::new(), Vec::<String>::new())
            .unwrap();
        // A file named like an excluded directory is kept
        assert!(classify(&entry(&dir, "build", false), &rules).is_none());
    }

    #[test]
    fn test_missing_entry_is_not_excluded() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRuleSet::default();
        let missing = FsEntry::resolve(&dir.path().join("node_modules"));
        assert_eq!(missing.kind(), EntryKind::Missing);
        assert!(classify(&missing, &rules).is_none());
    }

    #[test]
    fn test_verdict_serializes_like_listing_data() {
        let verdict = ExclusionVerdict {
            kind: ExclusionKind::DirectoryName,
            rule: ".git".to_string(),
        };
        let json = serde_json::to_string(&verdict).unwrap();
        assert_eq!(json, r#"{"type":"Directory Name","rule":".git"}"#);
    }
}
