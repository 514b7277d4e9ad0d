//! Text file reading for content assembly
//!
//! Reading is fault tolerant: a file that is not text is reported as a decode
//! failure (or decoded lossily, depending on `BinaryPolicy`) and I/O problems
//! are reported separately so callers can emit the right marker.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with files that are not valid UTF-8 text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryPolicy {
    /// Emit a `[binary file skipped]` marker instead of the content.
    #[default]
    Skip,
    /// Decode anyway, replacing invalid sequences with U+FFFD.
    Lossy,
}

impl fmt::Display for BinaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryPolicy::Skip => f.write_str("skip"),
            BinaryPolicy::Lossy => f.write_str("lossy"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("'{}' is not valid UTF-8 text", path.display())]
    Decode { path: PathBuf },
    #[error("{source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read `path` as text under `policy`.
///
/// With `BinaryPolicy::Skip`, content that is not UTF-8 or that contains NUL
/// bytes is a `ReadError::Decode`. With `BinaryPolicy::Lossy` decoding never
/// fails.
pub fn read_text_file(path: &Path, policy: BinaryPolicy) -> Result<String, ReadError> {
    let bytes = fs::read(path).map_err(|e| ReadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    match policy {
        BinaryPolicy::Lossy => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        BinaryPolicy::Skip => {
            if bytes.contains(&0) {
                return Err(ReadError::Decode {
                    path: path.to_path_buf(),
                });
            }
            String::from_utf8(bytes).map_err(|_| ReadError::Decode {
                path: path.to_path_buf(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_file_success() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("test.rs");
        fs::write(&file_path, "fn main() {}").unwrap();

        let content = read_text_file(&file_path, BinaryPolicy::Skip).unwrap();
        assert_eq!(content, "fn main() {}");
    }

    #[test]
    fn test_invalid_utf8_is_decode_error_when_skipping() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("image.png");
        fs::write(&file_path, [0x89, b'P', b'N', b'G', 0xff, 0xfe]).unwrap();

        let err = read_text_file(&file_path, BinaryPolicy::Skip).unwrap_err();
        assert!(matches!(err, ReadError::Decode { .. }));
    }

    #[test]
    fn test_nul_bytes_count_as_binary() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("data.bin");
        fs::write(&file_path, b"abc\0def").unwrap();

        assert!(matches!(
            read_text_file(&file_path, BinaryPolicy::Skip),
            Err(ReadError::Decode { .. })
        ));
        // Lossy keeps NUL bytes as-is
        assert_eq!(
            read_text_file(&file_path, BinaryPolicy::Lossy).unwrap(),
            "abc\0def"
        );
    }

    #[test]
    fn test_lossy_replaces_invalid_sequences() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("mixed.txt");
        fs::write(&file_path, [b'o', b'k', 0xff, b'!']).unwrap();

        let content = read_text_file(&file_path, BinaryPolicy::Lossy).unwrap();
        assert_eq!(content, "ok\u{FFFD}!");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_text_file(&dir.path().join("nope.txt"), BinaryPolicy::Lossy).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(serde_json::to_string(&BinaryPolicy::Lossy).unwrap(), "\"lossy\"");
        assert_eq!(BinaryPolicy::default(), BinaryPolicy::Skip);
        assert_eq!(BinaryPolicy::Skip.to_string(), "skip");
    }
}
