// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Folder-category metadata: a shallow tally of a directory's contents.
//!
//! Grounded on the `walkdir` usage pattern converged on across the pack
//! (`sra-spacebot`'s file tool, `vtcode-core`'s file ops) — bounded-depth,
//! symlink-skipping traversal rather than an unbounded recursive descent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// Maximum recursion depth when tallying a folder's contents (`spec.md`
/// §4.3): deep trees are summarized, not fully enumerated.
pub const MAX_TALLY_DEPTH: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderMeta {
    pub file_count: u64,
    pub subfolder_count: u64,
    pub total_size: u64,
    pub extension_histogram: HashMap<String, u64>,
    pub truncated: bool,
}

/// Tally a directory's immediate descendants up to `MAX_TALLY_DEPTH`,
/// skipping dotfiles/dot-directories and symlinks.
pub fn tally_folder(path: &Path) -> FolderMeta {
    let mut meta = FolderMeta::default();

    let walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(MAX_TALLY_DEPTH)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !name.starts_with('.'))
                .unwrap_or(false)
        });

    for entry in walker {
        let Ok(entry) = entry else {
            meta.truncated = true;
            continue;
        };
        if entry.path_is_symlink() {
            continue;
        }
        let Ok(file_type) = entry.metadata().map(|m| m.file_type()) else {
            meta.truncated = true;
            continue;
        };
        if file_type.is_dir() {
            meta.subfolder_count += 1;
        } else if file_type.is_file() {
            meta.file_count += 1;
            if let Ok(file_meta) = entry.metadata() {
                meta.total_size += file_meta.len();
            }
            if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
                *meta.extension_histogram.entry(ext.to_lowercase()).or_insert(0) += 1;
            }
        }
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_files_and_subfolders_skipping_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hi").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"there").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"secret").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/c.rs"), b"fn main() {}").unwrap();

        let meta = tally_folder(dir.path());
        assert_eq!(meta.file_count, 3);
        assert_eq!(meta.subfolder_count, 1);
        assert_eq!(meta.extension_histogram.get("txt"), Some(&2));
        assert_eq!(meta.extension_histogram.get("rs"), Some(&1));
    }

    #[test]
    fn empty_folder_has_zero_counts() {
        let dir = tempfile::tempdir().unwrap();
        let meta = tally_folder(dir.path());
        assert_eq!(meta.file_count, 0);
        assert_eq!(meta.subfolder_count, 0);
        assert_eq!(meta.total_size, 0);
    }
}
