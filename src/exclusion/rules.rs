//! Exclusion rule sets
//!
//! An `ExclusionRuleSet` names the directories, files and glob patterns that
//! never make it into a flattened document. Patterns are compiled once when
//! the set is built and are matched against base names only.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory names excluded by default.
pub const DEFAULT_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "venv",
    ".env",
    "env",
    "node_modules",
    ".next",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    "build",
    "dist",
    "target",
    "out",
    "site",
    ".vscode",
    ".idea",
];

/// File names excluded by default.
pub const DEFAULT_FILES: &[&str] = &[".DS_Store", "Thumbs.db", ".env"];

/// Glob patterns excluded by default (applied to files and directories).
pub const DEFAULT_PATTERNS: &[&str] = &[
    "*.pyc", "*.pyo", "*.swp", "*.swo", "*.swn", "*.log", "*.tmp", "*.temp", "*ignore", "*.lock",
];

const DEFAULT_DESCRIPTION: &str = "Built-in default exclusions.";

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("cannot access rules file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid rules file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// On-disk shape of a rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// A glob pattern compiled for base-name matching.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    matcher: Pattern,
}

impl NamePattern {
    pub fn new(source: &str) -> Result<Self, RulesError> {
        let matcher = Pattern::new(source).map_err(|e| RulesError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: source.to_string(),
            matcher,
        })
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.matches(name)
    }
}

/// Immutable set of exclusion rules.
///
/// Pattern order never changes the outcome of a check, it only decides which
/// pattern gets reported when several match.
#[derive(Debug, Clone)]
pub struct ExclusionRuleSet {
    description: Option<String>,
    dirs: BTreeSet<String>,
    files: BTreeSet<String>,
    patterns: Vec<NamePattern>,
}

impl ExclusionRuleSet {
    pub fn new<D, F, P>(dirs: D, files: F, patterns: P) -> Result<Self, RulesError>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| NamePattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            description: None,
            dirs: dirs.into_iter().map(Into::into).collect(),
            files: files.into_iter().map(Into::into).collect(),
            patterns,
        })
    }

    /// A rule set that excludes nothing.
    pub fn empty() -> Self {
        Self {
            description: None,
            dirs: BTreeSet::new(),
            files: BTreeSet::new(),
            patterns: Vec::new(),
        }
    }

    pub fn from_rule_file(file: RuleFile) -> Result<Self, RulesError> {
        let mut rules = Self::new(file.dirs, file.files, &file.patterns)?;
        rules.description = file.description;
        Ok(rules)
    }

    /// Load a rule set from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let raw = fs::read_to_string(path).map_err(|e| RulesError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: RuleFile = serde_json::from_str(&raw).map_err(|e| RulesError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        let rules = Self::from_rule_file(file)?;
        tracing::info!(
            path = %path.display(),
            dirs = rules.dirs.len(),
            files = rules.files.len(),
            patterns = rules.patterns.len(),
            "loaded exclusion rules"
        );
        Ok(rules)
    }

    /// Load from `path` when given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, RulesError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Persist the rule set as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), RulesError> {
        let io_err = |e| RulesError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.to_rule_file()).map_err(|e| {
            RulesError::Parse {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        fs::write(path, json + "\n").map_err(io_err)
    }

    pub fn to_rule_file(&self) -> RuleFile {
        RuleFile {
            description: self.description.clone(),
            dirs: self.dirs.iter().cloned().collect(),
            files: self.files.iter().cloned().collect(),
            patterns: self.patterns.iter().map(|p| p.source.clone()).collect(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn has_dir_name(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    pub fn has_file_name(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    /// First pattern matching `name`, if any.
    pub fn matching_pattern(&self, name: &str) -> Option<&NamePattern> {
        self.patterns.iter().find(|p| p.matches(name))
    }

    pub fn patterns(&self) -> &[NamePattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty() && self.patterns.is_empty()
    }
}

impl Default for ExclusionRuleSet {
    fn default() -> Self {
        Self {
            description: Some(DEFAULT_DESCRIPTION.to_string()),
            dirs: DEFAULT_DIRS.iter().map(|s| s.to_string()).collect(),
            files: DEFAULT_FILES.iter().map(|s| s.to_string()).collect(),
            patterns: DEFAULT_PATTERNS
                .iter()
                .filter_map(|p| NamePattern::new(p).ok())
                .collect(),
        }
    }
}
