// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration loading, merging, and normalization.
//!
//! Grounded on `config-core` from the reference agent-harness workspace:
//! JSON-Value-centric loading, schema validation via `schemars`/`jsonschema`,
//! and a deep-merge-objects/replace-arrays policy. The CLI argument parser
//! and the on-disk file format itself are out of this core's contracted
//! scope (`spec.md` §1) — only the normalized shape this module produces
//! (`FolderSpec`, `NormalizedConfig`) is.

pub mod env;
pub mod error;
pub mod folder_spec;
pub mod loader;
mod merge;
pub mod schema;

pub use error::{ConfigError, Result};
pub use folder_spec::{AiSettings, FolderSpec, ToolId, DEFAULT_DEBOUNCE_MS, DEFAULT_IGNORE_GLOBS};
pub use loader::{
    folder_spec_from_discovery, load_and_normalize, CliOverrides, FolderDefaults, NormalizedConfig,
};
