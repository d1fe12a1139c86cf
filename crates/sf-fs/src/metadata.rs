// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core stats + streaming SHA-256, always computed for every file (C3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::classifier::{classify, final_extension, Category};

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreMeta {
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub base_name: String,
    pub extension: Option<String>,
    pub size: u64,
    pub size_human: String,
    pub kind: FileKind,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub category: Category,
    pub sha256: String,
}

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Stream-hash a file's contents with SHA-256 without loading it fully into
/// memory — multi-gigabyte videos are in scope (`spec.md` §9).
pub fn stream_sha256(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit_idx = 0;
    while value >= 1024.0 && unit_idx < UNITS.len() - 1 {
        value /= 1024.0;
        unit_idx += 1;
    }
    if unit_idx == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.1} {}", UNITS[unit_idx])
    }
}

/// Compute the always-present core metadata for a file relative to its
/// watched folder root.
pub fn compute_core_meta(folder_root: &Path, absolute_path: &Path) -> Result<CoreMeta> {
    let meta = std::fs::symlink_metadata(absolute_path)?;
    let kind = if meta.is_symlink() {
        FileKind::Symlink
    } else if meta.file_type().is_dir() {
        FileKind::Directory
    } else if meta.file_type().is_file() {
        FileKind::Regular
    } else {
        FileKind::Other
    };

    let size = meta.len();
    let base_name = absolute_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = final_extension(&base_name);
    let category = if kind == FileKind::Directory {
        Category::Folder
    } else {
        classify(extension.as_deref(), mime_guess::from_path(absolute_path).first().map(|m| m.essence_str().to_string()).as_deref())
    };

    let sha256 = if kind == FileKind::Regular {
        stream_sha256(absolute_path)?
    } else {
        String::new()
    };

    let relative_path = absolute_path.strip_prefix(folder_root).unwrap_or(absolute_path).to_path_buf();

    Ok(CoreMeta {
        absolute_path: absolute_path.to_path_buf(),
        relative_path,
        base_name,
        extension,
        size,
        size_human: human_size(size),
        kind,
        created_at: meta.created().ok().map(DateTime::<Utc>::from),
        modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
        category,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_formats_bytes_and_larger_units() {
        assert_eq!(human_size(500), "500 B");
        assert_eq!(human_size(2048), "2.0 KiB");
    }

    #[test]
    fn stream_sha256_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();
        let digest = stream_sha256(&path).unwrap();
        assert_eq!(digest, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn compute_core_meta_classifies_and_hashes_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"content").unwrap();
        let meta = compute_core_meta(dir.path(), &path).unwrap();
        assert_eq!(meta.kind, FileKind::Regular);
        assert_eq!(meta.category, Category::Text);
        assert_eq!(meta.relative_path, PathBuf::from("notes.txt"));
        assert!(!meta.sha256.is_empty());
    }
}
