// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! State directory management: hashed per-folder state roots, persisted
//! metadata, and the append-only history log (C13).

pub mod history;
pub mod metadata;
pub mod paths;

pub use history::{append_history, HistoryRecord};
pub use metadata::{ensure_metadata, FolderStateMetadata, StateError};
pub use paths::{hash16, history_path, home, state_dir_for};
