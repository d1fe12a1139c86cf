// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The `smartfolder` command-line surface (`spec.md` §6): inline
//! single-folder mode, config-file-driven `run`/`validate`, and the
//! env/token-file credential lookup shared by both.

pub mod credentials;

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sf_config::{AiSettings, CliOverrides, FolderSpec, ToolId, DEFAULT_DEBOUNCE_MS, DEFAULT_IGNORE_GLOBS};
use sf_logging::CliLoggingArgs;

#[derive(Parser, Debug)]
#[command(name = "smartfolder", version, about = "Watch folders and let an agent organize them")]
pub struct Cli {
    /// Folder to watch in inline mode (omit when using `run`/`validate`)
    pub folder: Option<PathBuf>,

    /// Prompt describing what the agent should do with this folder (inline mode)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Don't actually write/move/rename files; log what would happen
    #[arg(long)]
    pub dry_run: bool,

    /// Attach watchers, then exit without waiting for events
    #[arg(long)]
    pub run_once: bool,

    #[command(flatten)]
    pub logging: CliLoggingArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every folder described by a config file
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        run_once: bool,
        #[command(flatten)]
        logging: CliLoggingArgs,
    },
    /// Parse and normalize a config file without running anything
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}

/// Build a normalized, single-entry `FolderSpec` for inline mode
/// (`smartfolder <folder> --prompt "..."`), using the same tool/ignore/
/// debounce defaults `sf-config` applies to an unconfigured folder entry.
pub fn inline_folder_spec(folder: PathBuf, prompt: String, dry_run: bool) -> anyhow::Result<FolderSpec> {
    let path = if folder.is_absolute() {
        folder
    } else {
        std::env::current_dir()?.join(folder)
    };

    Ok(FolderSpec {
        path,
        prompt,
        tools: ToolId::ALL.to_vec(),
        ignore_globs: DEFAULT_IGNORE_GLOBS.iter().map(|s| s.to_string()).collect(),
        debounce_ms: DEFAULT_DEBOUNCE_MS,
        poll_interval_ms: None,
        env: HashMap::new(),
        dry_run,
        ai: AiSettings {
            api_key: credentials::resolve_api_key(),
            ..AiSettings::default()
        },
        state_dir: PathBuf::new(),
        history_path: PathBuf::new(),
    })
}

pub fn overrides_from(dry_run: bool) -> CliOverrides {
    CliOverrides { dry_run }
}
