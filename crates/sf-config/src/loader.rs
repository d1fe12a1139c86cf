// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Read a config file from disk, validate it, and normalize it into either
//! a static list of `FolderSpec`s or a root-directory discovery config.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::env::resolve_env_tokens;
use crate::error::{ConfigError, Result};
use crate::folder_spec::{AiSettings, FolderSpec, ToolId, DEFAULT_DEBOUNCE_MS, DEFAULT_IGNORE_GLOBS};
use crate::schema::{validate_against_schema, RawConfig, RawFolderDefaults, RawFolderEntry};

/// Defaults applied to every folder discovered under a root directory.
#[derive(Debug, Clone)]
pub struct FolderDefaults {
    pub tools: Vec<ToolId>,
    pub ignore_globs: Vec<String>,
    pub debounce_ms: u64,
    pub poll_interval_ms: Option<u64>,
    pub env: HashMap<String, String>,
    pub dry_run: bool,
    pub ai: AiSettings,
}

/// The result of normalizing a config file: either the `folders` list,
/// fully resolved, or a root-directory discovery configuration.
#[derive(Debug, Clone)]
pub enum NormalizedConfig {
    Folders(Vec<FolderSpec>),
    RootDirectories {
        roots: Vec<PathBuf>,
        discovery_interval_ms: u64,
        defaults: FolderDefaults,
    },
}

/// CLI-level overrides that outrank anything in the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dry_run: bool,
}

pub fn read_raw(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load, validate, resolve env tokens, and normalize a config file.
pub fn load_and_normalize(path: &Path, overrides: &CliOverrides) -> Result<NormalizedConfig> {
    let mut raw_json = read_raw(path)?;
    validate_against_schema(&raw_json)?;
    resolve_env_tokens(&mut raw_json)?;

    let raw: RawConfig = serde_json::from_value(raw_json).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    normalize(raw, overrides)
}

fn parse_tools(names: &Option<Vec<String>>, fallback: &[ToolId]) -> Result<Vec<ToolId>> {
    match names {
        Some(names) => names.iter().map(|n| ToolId::parse(n)).collect(),
        None => Ok(fallback.to_vec()),
    }
}

fn base_ai(raw: &RawConfig) -> AiSettings {
    let default = AiSettings::default();
    AiSettings {
        provider: raw.ai.provider.clone().unwrap_or(default.provider),
        model: raw.ai.model.clone().unwrap_or(default.model),
        api_key: raw.ai.api_key.clone(),
        temperature: raw.ai.temperature,
        max_tool_calls: raw.ai.max_tool_calls.unwrap_or(default.max_tool_calls),
    }
}

fn base_defaults(raw: &RawConfig) -> Result<FolderDefaults> {
    let default_tool_names = raw.ai.default_tools.clone();
    let default_tools = parse_tools(&default_tool_names, &ToolId::ALL)?;

    Ok(FolderDefaults {
        tools: default_tools,
        ignore_globs: raw
            .ignore
            .clone()
            .unwrap_or_else(|| DEFAULT_IGNORE_GLOBS.iter().map(|s| s.to_string()).collect()),
        debounce_ms: raw.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
        poll_interval_ms: raw.poll_interval_ms,
        env: raw.env.clone().unwrap_or_default(),
        dry_run: raw.dry_run.unwrap_or(false),
        ai: base_ai(raw),
    })
}

fn apply_entry_overrides(defaults: &FolderDefaults, entry: &RawFolderEntry) -> Result<FolderDefaults> {
    Ok(FolderDefaults {
        tools: parse_tools(&entry.tools, &defaults.tools)?,
        ignore_globs: entry.ignore.clone().unwrap_or_else(|| defaults.ignore_globs.clone()),
        debounce_ms: entry.debounce_ms.unwrap_or(defaults.debounce_ms),
        poll_interval_ms: entry.poll_interval_ms.or(defaults.poll_interval_ms),
        env: merge_env(&defaults.env, &entry.env),
        dry_run: entry.dry_run.unwrap_or(defaults.dry_run),
        ai: defaults.ai.clone(),
    })
}

fn merge_env(base: &HashMap<String, String>, overlay: &Option<HashMap<String, String>>) -> HashMap<String, String> {
    let mut merged = base.clone();
    if let Some(overlay) = overlay {
        merged.extend(overlay.clone());
    }
    merged
}

fn normalize(raw: RawConfig, overrides: &CliOverrides) -> Result<NormalizedConfig> {
    let has_folders = raw.folders.is_some();
    let has_roots = raw.root_directories.is_some();

    if has_folders == has_roots {
        return Err(ConfigError::FoldersXorRoots {
            got: if has_folders { "both" } else { "neither" },
        });
    }

    let global_default_overrides = raw.global_defaults.clone();
    let mut defaults = base_defaults(&raw)?;
    if let Some(overlay) = &global_default_overrides {
        defaults = apply_global_defaults(&defaults, overlay)?;
    }

    if let Some(roots) = raw.root_directories {
        let roots = roots
            .into_iter()
            .map(|p| resolve_absolute(&p))
            .collect::<Result<Vec<_>>>()?;
        return Ok(NormalizedConfig::RootDirectories {
            roots,
            discovery_interval_ms: raw.discovery_interval_ms.unwrap_or(5_000),
            defaults,
        });
    }

    let entries = raw.folders.expect("checked above");
    let mut specs = Vec::with_capacity(entries.len());
    for entry in entries {
        let resolved = apply_entry_overrides(&defaults, &entry)?;
        let prompt = entry.prompt.clone().unwrap_or_default();
        let mut spec = FolderSpec {
            path: resolve_absolute(&entry.path)?,
            prompt,
            tools: resolved.tools,
            ignore_globs: resolved.ignore_globs,
            debounce_ms: resolved.debounce_ms,
            poll_interval_ms: resolved.poll_interval_ms,
            env: resolved.env,
            dry_run: resolved.dry_run,
            ai: resolved.ai,
            state_dir: PathBuf::new(),
            history_path: PathBuf::new(),
        };
        if overrides.dry_run {
            spec.dry_run = true;
        }
        specs.push(spec);
    }

    Ok(NormalizedConfig::Folders(specs))
}

fn apply_global_defaults(defaults: &FolderDefaults, overlay: &RawFolderDefaults) -> Result<FolderDefaults> {
    Ok(FolderDefaults {
        tools: parse_tools(&overlay.tools, &defaults.tools)?,
        ignore_globs: overlay.ignore.clone().unwrap_or_else(|| defaults.ignore_globs.clone()),
        debounce_ms: overlay.debounce_ms.unwrap_or(defaults.debounce_ms),
        poll_interval_ms: overlay.poll_interval_ms.or(defaults.poll_interval_ms),
        env: merge_env(&defaults.env, &overlay.env),
        dry_run: overlay.dry_run.unwrap_or(defaults.dry_run),
        ai: defaults.ai.clone(),
    })
}

fn resolve_absolute(raw_path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw_path);
    if path.is_absolute() {
        Ok(path)
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .map_err(|_| ConfigError::InvalidFolderPath(raw_path.to_string()))
    }
}

/// Build a `FolderSpec` for a folder discovered dynamically under a root
/// directory (C12), using the root config's resolved defaults and the
/// `smartfolder.md` prompt text found for that folder.
pub fn folder_spec_from_discovery(folder_path: PathBuf, prompt: String, defaults: &FolderDefaults) -> FolderSpec {
    FolderSpec {
        path: folder_path,
        prompt,
        tools: defaults.tools.clone(),
        ignore_globs: defaults.ignore_globs.clone(),
        debounce_ms: defaults.debounce_ms,
        poll_interval_ms: defaults.poll_interval_ms,
        env: defaults.env.clone(),
        dry_run: defaults.dry_run,
        ai: defaults.ai.clone(),
        state_dir: PathBuf::new(),
        history_path: PathBuf::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_config(dir: &tempfile::TempDir, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn rejects_config_with_both_folders_and_roots() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            json!({
                "ai": {"provider": "openai", "model": "gpt-4o-mini"},
                "folders": [{"path": "/tmp/a"}],
                "rootDirectories": ["/tmp"]
            }),
        );
        let err = load_and_normalize(&path, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::FoldersXorRoots { .. }));
    }

    #[test]
    fn rejects_config_with_neither_folders_nor_roots() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, json!({"ai": {"provider": "openai", "model": "gpt-4o-mini"}}));
        let err = load_and_normalize(&path, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::FoldersXorRoots { .. }));
    }

    #[test]
    fn normalizes_folders_with_inherited_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("watched");
        std::fs::create_dir(&folder).unwrap();
        let path = write_config(
            &dir,
            json!({
                "ai": {"provider": "openai", "model": "gpt-4o-mini", "maxToolCalls": 5},
                "folders": [{"path": folder.to_string_lossy(), "prompt": "organize"}],
                "dryRun": true
            }),
        );
        let normalized = load_and_normalize(&path, &CliOverrides::default()).unwrap();
        match normalized {
            NormalizedConfig::Folders(specs) => {
                assert_eq!(specs.len(), 1);
                assert_eq!(specs[0].prompt, "organize");
                assert!(specs[0].dry_run);
                assert_eq!(specs[0].ai.max_tool_calls, 5);
                assert_eq!(specs[0].tools.len(), 9);
            }
            _ => panic!("expected Folders variant"),
        }
    }

    #[test]
    fn cli_dry_run_override_forces_true() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("watched");
        std::fs::create_dir(&folder).unwrap();
        let path = write_config(
            &dir,
            json!({
                "ai": {"provider": "openai", "model": "gpt-4o-mini"},
                "folders": [{"path": folder.to_string_lossy(), "prompt": "organize", "dryRun": false}]
            }),
        );
        let normalized =
            load_and_normalize(&path, &CliOverrides { dry_run: true }).unwrap();
        match normalized {
            NormalizedConfig::Folders(specs) => assert!(specs[0].dry_run),
            _ => panic!("expected Folders variant"),
        }
    }

    #[test]
    fn per_folder_tool_subset_overrides_default_tools() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("watched");
        std::fs::create_dir(&folder).unwrap();
        let path = write_config(
            &dir,
            json!({
                "ai": {"provider": "openai", "model": "gpt-4o-mini"},
                "folders": [{"path": folder.to_string_lossy(), "prompt": "x", "tools": ["read_file", "rename_file"]}]
            }),
        );
        let normalized = load_and_normalize(&path, &CliOverrides::default()).unwrap();
        match normalized {
            NormalizedConfig::Folders(specs) => {
                assert_eq!(specs[0].tools, vec![ToolId::ReadFile, ToolId::RenameFile]);
            }
            _ => panic!("expected Folders variant"),
        }
    }

    #[test]
    fn root_directories_mode_carries_discovery_interval() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("projects");
        std::fs::create_dir(&root).unwrap();
        let path = write_config(
            &dir,
            json!({
                "ai": {"provider": "openai", "model": "gpt-4o-mini"},
                "rootDirectories": [root.to_string_lossy()],
                "discoveryIntervalMs": 2000
            }),
        );
        let normalized = load_and_normalize(&path, &CliOverrides::default()).unwrap();
        match normalized {
            NormalizedConfig::RootDirectories { discovery_interval_ms, roots, .. } => {
                assert_eq!(discovery_interval_ms, 2000);
                assert_eq!(roots.len(), 1);
            }
            _ => panic!("expected RootDirectories variant"),
        }
    }

    #[test]
    fn unknown_env_token_in_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("watched");
        std::fs::create_dir(&folder).unwrap();
        let path = write_config(
            &dir,
            json!({
                "ai": {"provider": "openai", "model": "gpt-4o-mini", "apiKey": "$SOME_OTHER_SECRET"},
                "folders": [{"path": folder.to_string_lossy(), "prompt": "x"}]
            }),
        );
        let err = load_and_normalize(&path, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotAllowed(name) if name == "SOME_OTHER_SECRET"));
    }
}
