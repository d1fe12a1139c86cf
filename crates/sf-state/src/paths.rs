// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! State directory resolution (C13).
//!
//! Grounded on the `dirs::home_dir()` fallback pattern used throughout the
//! reference agent-harness workspace (`ah-logging`, `ah-agents`) for
//! locating a user-scoped state root.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Returns `SMARTFOLDER_HOME` if set, else `~/.smartfolder`. Falls back to
/// `/tmp/.smartfolder` in the unlikely case the home directory can't be
/// resolved at all.
pub fn home() -> PathBuf {
    if let Ok(value) = std::env::var("SMARTFOLDER_HOME") {
        return PathBuf::from(value);
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join(".smartfolder")
}

/// First 16 hex characters of `sha256(normalize(resolve(folder_path)))`.
pub fn hash16(folder_path: &Path) -> String {
    let normalized = normalize_lexically(folder_path);
    let mut hasher = Sha256::new();
    hasher.update(normalized.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")).join(path)
    };

    let mut result = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}

pub fn state_dir_for(folder_path: &Path) -> PathBuf {
    home().join("state").join(hash16(folder_path))
}

pub fn history_path(folder_path: &Path) -> PathBuf {
    state_dir_for(folder_path).join("history.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash16_is_deterministic_for_the_same_path() {
        let a = hash16(Path::new("/tmp/dl"));
        let b = hash16(Path::new("/tmp/dl"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn hash16_differs_between_distinct_folders() {
        assert_ne!(hash16(Path::new("/tmp/dl")), hash16(Path::new("/tmp/other")));
    }

    #[test]
    fn hash16_normalizes_dot_segments_to_the_same_value() {
        assert_eq!(hash16(Path::new("/tmp/dl/../dl")), hash16(Path::new("/tmp/dl")));
    }

    #[test]
    fn state_dir_lies_outside_the_folder_it_describes() {
        unsafe {
            std::env::set_var("SMARTFOLDER_HOME", "/tmp/smartfolder-home-test");
        }
        let dir = state_dir_for(Path::new("/tmp/dl"));
        assert!(!dir.starts_with("/tmp/dl"));
    }
}
