// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The normalized, validated shape every watched folder is reduced to.
//!
//! This is the one piece of configuration this workspace contracts per
//! `spec.md` §3 — everything upstream of it (file format, merge precedence,
//! CLI flag parsing) is a collaborator whose job is only to produce this
//! shape correctly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// One of the nine sandboxed tools a folder's agent loop may be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    ReadFile,
    WriteFile,
    RenameFile,
    MoveFile,
    Grep,
    Sed,
    Head,
    Tail,
    CreateFolder,
}

impl ToolId {
    pub const ALL: [ToolId; 9] = [
        ToolId::ReadFile,
        ToolId::WriteFile,
        ToolId::RenameFile,
        ToolId::MoveFile,
        ToolId::Grep,
        ToolId::Sed,
        ToolId::Head,
        ToolId::Tail,
        ToolId::CreateFolder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::ReadFile => "read_file",
            ToolId::WriteFile => "write_file",
            ToolId::RenameFile => "rename_file",
            ToolId::MoveFile => "move_file",
            ToolId::Grep => "grep",
            ToolId::Sed => "sed",
            ToolId::Head => "head",
            ToolId::Tail => "tail",
            ToolId::CreateFolder => "create_folder",
        }
    }

    pub fn parse(s: &str) -> Result<ToolId> {
        ToolId::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownTool(s.to_string()))
    }
}

/// AI/model settings shared across folders unless a folder overrides them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    pub max_tool_calls: u32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: None,
            max_tool_calls: 20,
        }
    }
}

/// A single watched directory, fully normalized: absolute path, resolved
/// prompt text, concrete tool subset, and per-folder timing/overrides.
///
/// `state_dir`/`history_path` start empty and are filled in by
/// `sf-state::apply_state_paths` once the config is loaded — state-directory
/// hashing is that crate's responsibility, not the config loader's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSpec {
    pub path: PathBuf,
    pub prompt: String,
    pub tools: Vec<ToolId>,
    pub ignore_globs: Vec<String>,
    pub debounce_ms: u64,
    pub poll_interval_ms: Option<u64>,
    pub env: HashMap<String, String>,
    pub dry_run: bool,
    pub ai: AiSettings,
    #[serde(default)]
    pub state_dir: PathBuf,
    #[serde(default)]
    pub history_path: PathBuf,
}

impl FolderSpec {
    pub fn tool_is_enabled(&self, tool: ToolId) -> bool {
        self.tools.contains(&tool)
    }
}

pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;
pub const DEFAULT_IGNORE_GLOBS: &[&str] = &["**/node_modules/**", "**/.git/**", "**/.smartfolder/**"];
