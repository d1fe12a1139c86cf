// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Filesystem primitives: path sandboxing, classification, and metadata
//! extraction (C1-C3).

pub mod classifier;
pub mod extractor;
pub mod file_event;
pub mod folder_extractor;
pub mod metadata;
pub mod sandbox;
pub mod self_change;

pub use classifier::{classify, final_extension, Category};
pub use extractor::{Extractor, ExtractorRegistry, TypedMeta};
pub use file_event::{FileEvent, MetadataBlob};
pub use folder_extractor::{tally_folder, FolderMeta, MAX_TALLY_DEPTH};
pub use metadata::{compute_core_meta, stream_sha256, CoreMeta, FileKind, MetadataError};
pub use sandbox::{contain, ensure_parent_dir, read_capped, SandboxError, MAX_READ_BYTES};
pub use self_change::{SelfChangeTracker, IGNORE_WINDOW};
