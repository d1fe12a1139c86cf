// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-folder persisted state: `metadata.json` and the read-or-create
//! logic that preserves `firstWatchedAt` across runs (C13).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::paths::{hash16, state_dir_for};

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderStateMetadata {
    #[serde(rename = "folderPath")]
    pub folder_path: String,
    pub hash: String,
    #[serde(rename = "firstWatchedAt")]
    pub first_watched_at: DateTime<Utc>,
    #[serde(rename = "lastRunAt")]
    pub last_run_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Read `<state_dir>/metadata.json` if present, merging in an updated
/// `lastRunAt` and preserving `firstWatchedAt`; otherwise create it fresh.
/// The state directory itself is created if missing.
pub fn ensure_metadata(folder_path: &Path, prompt: Option<&str>, now: DateTime<Utc>) -> Result<FolderStateMetadata> {
    let state_dir = state_dir_for(folder_path);
    std::fs::create_dir_all(&state_dir)?;
    let metadata_path = state_dir.join("metadata.json");

    let mut metadata = match std::fs::read_to_string(&metadata_path) {
        Ok(raw) => serde_json::from_str::<FolderStateMetadata>(&raw)?,
        Err(_) => FolderStateMetadata {
            folder_path: folder_path.to_string_lossy().to_string(),
            hash: hash16(folder_path),
            first_watched_at: now,
            last_run_at: now,
            prompt: prompt.map(str::to_string),
        },
    };

    metadata.last_run_at = now;
    if prompt.is_some() {
        metadata.prompt = prompt.map(str::to_string);
    }

    let serialized = serde_json::to_string_pretty(&metadata)?;
    std::fs::write(&metadata_path, serialized)?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn first_run_creates_metadata_with_matching_first_and_last_run() {
        unsafe {
            std::env::set_var("SMARTFOLDER_HOME", "/tmp/sf-state-test-1");
        }
        let _ = std::fs::remove_dir_all("/tmp/sf-state-test-1");
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let meta = ensure_metadata(Path::new("/tmp/dl"), Some("organize"), now).unwrap();
        assert_eq!(meta.first_watched_at, now);
        assert_eq!(meta.last_run_at, now);
    }

    #[test]
    fn second_run_preserves_first_watched_at_but_updates_last_run_at() {
        unsafe {
            std::env::set_var("SMARTFOLDER_HOME", "/tmp/sf-state-test-2");
        }
        let _ = std::fs::remove_dir_all("/tmp/sf-state-test-2");
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();

        ensure_metadata(Path::new("/tmp/dl"), Some("organize"), first).unwrap();
        let meta = ensure_metadata(Path::new("/tmp/dl"), None, second).unwrap();

        assert_eq!(meta.first_watched_at, first);
        assert_eq!(meta.last_run_at, second);
        assert_eq!(meta.prompt.as_deref(), Some("organize"));
    }
}
