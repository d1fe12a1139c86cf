// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Path containment and byte-capped reads (C1).
//!
//! Grounded on the workspace-relative-path pattern in `vtcode-core`'s
//! `file_ops::tool::FileOpsTool` (`strip_prefix` against a canonicalized
//! root), inverted here: instead of falling back to the raw path when the
//! candidate escapes the root, containment failure is a hard error.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("path escapes the watched folder")]
    PathEscape,

    #[error("file exceeds the {max_bytes}-byte read cap ({actual} bytes)")]
    SizeExceeded { max_bytes: u64, actual: u64 },

    #[error("not a regular file: {0:?}")]
    NotRegularFile(PathBuf),

    #[error("path already exists: {0:?}")]
    AlreadyExists(PathBuf),

    #[error("path does not exist: {0:?}")]
    Missing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SandboxError>;

/// Default per-read byte cap (`spec.md` §4.1).
pub const MAX_READ_BYTES: u64 = 256 * 1024;

/// Resolve `candidate` (absolute or relative to `folder_root`) and verify it
/// stays within `folder_root`. Does not require the path to exist — callers
/// that need existence call `assert_exists`/`assert_not_exists` separately.
pub fn contain(folder_root: &Path, candidate: &Path) -> Result<PathBuf> {
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        folder_root.join(candidate)
    };

    let normalized = normalize_lexically(&joined);
    let normalized_root = normalize_lexically(folder_root);

    let relative = normalized
        .strip_prefix(&normalized_root)
        .map_err(|_| SandboxError::PathEscape)?;

    if relative.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return Err(SandboxError::PathEscape);
    }

    Ok(normalized)
}

/// Lexical (no I/O) path normalization: resolves `.`/`..` components without
/// requiring the path to exist, so containment can be checked before a
/// `write_file`/`create_folder` target exists on disk.
fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component.as_os_str());
                }
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}

pub fn ensure_parent_dir(abs: &Path) -> Result<()> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn assert_exists(abs: &Path) -> Result<()> {
    if abs.exists() {
        Ok(())
    } else {
        Err(SandboxError::Missing(abs.to_path_buf()))
    }
}

pub fn assert_not_exists(abs: &Path) -> Result<()> {
    if abs.exists() {
        Err(SandboxError::AlreadyExists(abs.to_path_buf()))
    } else {
        Ok(())
    }
}

/// Read a file's full contents, refusing non-regular files and anything
/// larger than `max_bytes`.
pub fn read_capped(abs: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let meta = fs::metadata(abs)?;
    if !meta.is_file() {
        return Err(SandboxError::NotRegularFile(abs.to_path_buf()));
    }
    if meta.len() > max_bytes {
        return Err(SandboxError::SizeExceeded {
            max_bytes,
            actual: meta.len(),
        });
    }
    Ok(fs::read(abs)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_path_inside_folder() {
        let root = Path::new("/tmp/dl");
        let result = contain(root, Path::new("a.pdf")).unwrap();
        assert_eq!(result, PathBuf::from("/tmp/dl/a.pdf"));
    }

    #[test]
    fn rejects_parent_dir_escape() {
        let root = Path::new("/tmp/dl");
        let err = contain(root, Path::new("../../etc/passwd")).unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape));
    }

    #[test]
    fn rejects_absolute_escape_outside_root() {
        let root = Path::new("/tmp/dl");
        let err = contain(root, Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape));
    }

    #[test]
    fn allows_nested_subdirectory() {
        let root = Path::new("/tmp/dl");
        let result = contain(root, Path::new("sub/dir/file.txt")).unwrap();
        assert_eq!(result, PathBuf::from("/tmp/dl/sub/dir/file.txt"));
    }

    #[test]
    fn read_capped_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, vec![0u8; 100]).unwrap();
        let err = read_capped(&path, 10).unwrap_err();
        assert!(matches!(err, SandboxError::SizeExceeded { .. }));
    }

    #[test]
    fn read_capped_reads_within_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.txt");
        std::fs::write(&path, b"hello").unwrap();
        let bytes = read_capped(&path, MAX_READ_BYTES).unwrap();
        assert_eq!(bytes, b"hello");
    }
}
