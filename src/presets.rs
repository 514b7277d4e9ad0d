//! Named, persisted selections
//!
//! Presets live under `<app root>/presets/selections/{default,user}` as JSON
//! arrays of path strings. Paths inside the application root are stored
//! relative to it so a preset keeps working when the root moves.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Presets directory, relative to the application root.
pub const PRESETS_DIR: &str = "presets/selections";

/// Name of the preset created by `ensure_default`.
pub const DEFAULT_PRESET: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    /// Shipped with the application, read-only
    Default,
    User,
}

impl PresetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetKind::Default => "default",
            PresetKind::User => "user",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(PresetKind::Default),
            "user" => Some(PresetKind::User),
            _ => None,
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PresetKind,
    /// `<type>/<name>`
    pub id: String,
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("invalid preset id '{0}', expected <default|user>/<name>")]
    InvalidId(String),
    #[error("invalid preset name '{0}'")]
    InvalidName(String),
    #[error("preset '{0}' not found")]
    NotFound(String),
    #[error("preset '{0}' is not a user preset and cannot be deleted")]
    ReadOnly(String),
    #[error("preset '{}' is not a JSON array of paths", path.display())]
    InvalidFormat { path: PathBuf },
    #[error("cannot access preset '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid preset file '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keep ASCII alphanumerics, `-` and `_`; `None` if nothing is left.
pub fn sanitize_name(name: &str) -> Option<String> {
    let safe: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if safe.is_empty() { None } else { Some(safe) }
}

/// Preset storage rooted at an application directory.
#[derive(Debug, Clone)]
pub struct PresetStore {
    app_root: PathBuf,
}

impl PresetStore {
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        let app_root = app_root.into();
        Self {
            app_root: fs::canonicalize(&app_root).unwrap_or(app_root),
        }
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    pub fn dir(&self, kind: PresetKind) -> PathBuf {
        self.app_root.join(PRESETS_DIR).join(kind.as_str())
    }

    fn file(&self, kind: PresetKind, name: &str) -> Result<PathBuf, PresetError> {
        let safe = sanitize_name(name).ok_or_else(|| PresetError::InvalidName(name.to_string()))?;
        Ok(self.dir(kind).join(format!("{}.json", safe)))
    }

    /// Default presets, then user presets, each sorted by name.
    pub fn list(&self) -> Result<Vec<PresetSummary>, PresetError> {
        let mut presets = Vec::new();
        for kind in [PresetKind::Default, PresetKind::User] {
            let dir = self.dir(kind);
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(PresetError::Io { path: dir, source: e }),
            };

            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
                .collect();
            names.sort();

            presets.extend(names.into_iter().map(|name| PresetSummary {
                id: format!("{}/{}", kind, name),
                name,
                kind,
            }));
        }
        Ok(presets)
    }

    /// Load a preset as absolute paths. Relative entries are taken against
    /// the application root.
    pub fn load(&self, id: &str) -> Result<Vec<PathBuf>, PresetError> {
        let (kind, name) = parse_id(id)?;
        let path = self.file(kind, name)?;
        if !path.is_file() {
            return Err(PresetError::NotFound(id.to_string()));
        }

        let raw = fs::read_to_string(&path).map_err(|e| PresetError::Io {
            path: path.clone(),
            source: e,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| PresetError::Json {
                path: path.clone(),
                source: e,
            })?;
        let entries: Vec<String> =
            serde_json::from_value(value).map_err(|_| PresetError::InvalidFormat { path })?;

        Ok(entries
            .iter()
            .map(|entry| {
                let p = Path::new(entry);
                let absolute = if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    self.app_root.join(p)
                };
                resolve_lenient(absolute)
            })
            .collect())
    }

    /// Save `paths` as a user preset and return its id.
    pub fn save<S: AsRef<str>>(&self, name: &str, paths: &[S]) -> Result<String, PresetError> {
        let safe = sanitize_name(name).ok_or_else(|| PresetError::InvalidName(name.to_string()))?;
        let path = self.file(PresetKind::User, &safe)?;

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let stored: Vec<String> = paths
            .iter()
            .map(|raw| {
                let resolved = resolve_lenient(cwd.join(raw.as_ref()));
                match resolved.strip_prefix(&self.app_root) {
                    Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
                    Ok(_) => ".".to_string(),
                    Err(_) => resolved.display().to_string(),
                }
            })
            .collect();

        write_json(&path, &stored)?;
        tracing::info!(preset = %safe, paths = stored.len(), "saved user preset");
        Ok(format!("{}/{}", PresetKind::User, safe))
    }

    /// Delete a user preset.
    pub fn delete(&self, id: &str) -> Result<(), PresetError> {
        let (kind, name) = parse_id(id)?;
        if kind != PresetKind::User {
            return Err(PresetError::ReadOnly(id.to_string()));
        }
        let path = self.file(kind, name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(preset = id, "deleted user preset");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PresetError::NotFound(id.to_string()))
            }
            Err(e) => Err(PresetError::Io { path, source: e }),
        }
    }

    /// Create an empty `default/default` preset if there is none.
    /// Returns whether a file was written.
    pub fn ensure_default(&self) -> Result<bool, PresetError> {
        let path = self.file(PresetKind::Default, DEFAULT_PRESET)?;
        if path.exists() {
            return Ok(false);
        }
        write_json(&path, &[])?;
        tracing::info!(path = %path.display(), "created empty default preset");
        Ok(true)
    }
}

fn parse_id(id: &str) -> Result<(PresetKind, &str), PresetError> {
    let (kind, name) = id
        .split_once('/')
        .ok_or_else(|| PresetError::InvalidId(id.to_string()))?;
    let kind = PresetKind::parse(kind).ok_or_else(|| PresetError::InvalidId(id.to_string()))?;
    Ok((kind, name))
}

/// Canonical form when the path exists, the path unchanged otherwise.
fn resolve_lenient(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

fn write_json(path: &Path, paths: &[String]) -> Result<(), PresetError> {
    let io_err = |e| PresetError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(paths).map_err(|e| PresetError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, json).map_err(io_err)
}
