// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Smart-folder discovery (C12): poll-based search for `smartfolder.md`
//! configuration files beneath one or more root directories, plus
//! per-file content watching once discovered.

use globset::GlobSet;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use walkdir::{DirEntry, WalkDir};

use crate::ignore::is_ignored;

pub const CONFIG_FILE_NAME: &str = "smartfolder.md";
pub const MAX_CONFIG_BYTES: u64 = 1024 * 1024;
pub const MAX_PROMPT_CHARS: usize = 50_000;
pub const IDENTICAL_RUN_WARN_THRESHOLD: usize = 1_000;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("smartfolder.md at {0} exceeds the 1 MiB size cap")]
    FileTooLarge(PathBuf),
    #[error("smartfolder.md at {0} exceeds {MAX_PROMPT_CHARS} characters")]
    PromptTooLong(PathBuf),
    #[error("smartfolder.md at {0} has an empty prompt")]
    EmptyPrompt(PathBuf),
    #[error("smartfolder.md at {0} contains a NUL byte")]
    ContainsNul(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    Added { path: PathBuf, prompt: String },
    Changed { path: PathBuf, prompt: String },
    Removed { path: PathBuf },
}

fn is_symlink(entry: &DirEntry) -> bool {
    entry.path_is_symlink()
}

/// Read and validate one `smartfolder.md`. The whole file content is the
/// prompt, per `spec.md` §4.12's parsing contract.
pub fn parse_config_file(path: &Path) -> Result<String, DiscoveryError> {
    let meta = fs::symlink_metadata(path)?;
    if meta.len() > MAX_CONFIG_BYTES {
        return Err(DiscoveryError::FileTooLarge(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    if bytes.contains(&0) {
        return Err(DiscoveryError::ContainsNul(path.to_path_buf()));
    }

    let prompt = String::from_utf8_lossy(&bytes).into_owned();
    if prompt.is_empty() {
        return Err(DiscoveryError::EmptyPrompt(path.to_path_buf()));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(DiscoveryError::PromptTooLong(path.to_path_buf()));
    }

    warn_on_unusual_content(path, &prompt);
    Ok(prompt)
}

fn warn_on_unusual_content(path: &Path, prompt: &str) {
    let mut run_char = None;
    let mut run_len = 0usize;
    for ch in prompt.chars() {
        if Some(ch) == run_char {
            run_len += 1;
        } else {
            run_char = Some(ch);
            run_len = 1;
        }
        if run_len > IDENTICAL_RUN_WARN_THRESHOLD {
            tracing::warn!(path = %path.display(), "smartfolder.md contains a run of >1000 identical characters");
            break;
        }
    }

    if prompt.chars().any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t') {
        tracing::warn!(path = %path.display(), "smartfolder.md contains unusual control characters");
    }
}

/// Walk `roots` once, following the symlink-skip / ignore-glob / case
/// insensitive rules in `spec.md` §4.12, and return the set of matching
/// config file paths found on this pass.
pub fn scan_once(roots: &[PathBuf], ignore_globs: &GlobSet) -> BTreeSet<PathBuf> {
    let mut found = BTreeSet::new();

    for root in roots {
        if fs::symlink_metadata(root).map(|m| m.file_type().is_symlink()).unwrap_or(true) {
            if fs::symlink_metadata(root).is_ok() {
                tracing::debug!(root = %root.display(), "skipping symlinked discovery root");
            }
            continue;
        }

        let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
            if is_symlink(entry) {
                return false;
            }
            !is_ignored(ignore_globs, entry.path())
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory during discovery");
                    continue;
                }
            };

            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().eq_ignore_ascii_case(CONFIG_FILE_NAME)
            {
                found.insert(entry.path().to_path_buf());
            }
        }
    }

    found
}

/// Diff `current` against `previous`, returning `(added, removed)` path sets.
pub fn diff(previous: &BTreeSet<PathBuf>, current: &BTreeSet<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let added = current.difference(previous).cloned().collect();
    let removed = previous.difference(current).cloned().collect();
    (added, removed)
}

/// Run the discovery poller until `stop_rx` fires, emitting `DiscoveryEvent`s
/// on the returned channel. Content changes to an already-discovered config
/// file are caught by re-parsing it on every tick and comparing against the
/// last prompt seen for that path, rather than attaching a dedicated native
/// watcher per file — the discovery tick interval already bounds how quickly
/// a change is noticed, and `smartfolder.md` files change rarely.
pub fn run_discovery(
    roots: Vec<PathBuf>,
    ignore_globs: GlobSet,
    tick_interval: Duration,
) -> (mpsc::UnboundedReceiver<DiscoveryEvent>, tokio::sync::oneshot::Sender<()>) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let mut previous: BTreeSet<PathBuf> = BTreeSet::new();
        let mut known_prompts: HashMap<PathBuf, String> = HashMap::new();
        let mut interval = tokio::time::interval(tick_interval);

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = interval.tick() => {
                    let current = scan_once(&roots, &ignore_globs);
                    let (added, removed) = diff(&previous, &current);

                    for path in added {
                        match parse_config_file(&path) {
                            Ok(prompt) => {
                                known_prompts.insert(path.clone(), prompt.clone());
                                if out_tx.send(DiscoveryEvent::Added { path, prompt }).is_err() {
                                    return;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(path = %path.display(), error = %err, "rejecting smartfolder.md");
                            }
                        }
                    }

                    for path in removed {
                        known_prompts.remove(&path);
                        if out_tx.send(DiscoveryEvent::Removed { path }).is_err() {
                            return;
                        }
                    }

                    for path in current.intersection(&previous) {
                        match parse_config_file(path) {
                            Ok(prompt) => {
                                if known_prompts.get(path) != Some(&prompt) {
                                    known_prompts.insert(path.clone(), prompt.clone());
                                    if out_tx.send(DiscoveryEvent::Changed { path: path.clone(), prompt }).is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(err) => {
                                tracing::warn!(path = %path.display(), error = %err, "smartfolder.md became invalid, leaving prior config attached");
                            }
                        }
                    }

                    previous = current;
                }
            }
        }
    });

    (out_rx, stop_tx)
}
