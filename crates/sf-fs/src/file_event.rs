// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The watcher's internal work item (`spec.md` §3).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::classifier::Category;
use crate::extractor::TypedMeta;
use crate::metadata::CoreMeta;

/// Metadata blob attached to a `FileEvent`: the always-present core stats
/// plus whatever category-specific extractor contributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataBlob {
    pub core: CoreMeta,
    #[serde(flatten)]
    pub typed: TypedMeta,
}

/// One unit of work produced by the folder watcher and consumed by a
/// folder's job queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvent {
    pub folder_ref: PathBuf,
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub size: Option<u64>,
    pub mime: Option<String>,
    pub category: Category,
    pub metadata_blob: MetadataBlob,
}

impl FileEvent {
    pub fn new(folder_ref: PathBuf, core: CoreMeta, typed: TypedMeta, mime: Option<String>) -> Self {
        Self {
            folder_ref,
            absolute_path: core.absolute_path.clone(),
            relative_path: core.relative_path.clone(),
            size: Some(core.size),
            mime,
            category: core.category,
            metadata_blob: MetadataBlob { core, typed },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{compute_core_meta, FileKind};

    #[test]
    fn new_copies_core_fields_onto_the_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, b"hi").unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        assert_eq!(core.kind, FileKind::Regular);

        let event = FileEvent::new(dir.path().to_path_buf(), core, TypedMeta::default(), Some("text/plain".into()));
        assert_eq!(event.relative_path, PathBuf::from("note.txt"));
        assert_eq!(event.size, Some(2));
        assert_eq!(event.category, Category::Text);
    }
}
