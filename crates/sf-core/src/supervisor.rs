// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Supervisor / orchestrator (C14): wires discovery/watchers into the
//! per-folder job queue, and owns startup/shutdown.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sf_config::{CliOverrides, FolderDefaults, FolderSpec, NormalizedConfig};
use sf_fs::{ExtractorRegistry, SelfChangeTracker};
use sf_llm::{ModelClient, OpenAiModelClient};
use sf_prompt::Thresholds;
use sf_queue::QueueManager;
use sf_watch::{build_globset, watch_folder, DiscoveryEvent, WatcherHandle};

use crate::error::Result;
use crate::job::{process_file, FolderRuntime};

fn build_client(ai: &sf_config::AiSettings) -> Arc<dyn ModelClient> {
    let api_key = ai.api_key.clone().unwrap_or_default();
    Arc::new(OpenAiModelClient::new(&api_key, None))
}

/// State shared by every attached folder: the self-change suppressor, the
/// per-folder job queue, the extractor registry, and the content thresholds.
/// Cheap to clone — every field is an `Arc`.
#[derive(Clone)]
struct SharedState {
    queue: QueueManager,
    ignore: Arc<SelfChangeTracker>,
    extractors: Arc<ExtractorRegistry>,
    thresholds: Arc<Thresholds>,
    handles: Arc<Mutex<HashMap<PathBuf, WatcherHandle>>>,
}

impl SharedState {
    fn new() -> Self {
        let ignore = Arc::new(SelfChangeTracker::new());
        Self {
            queue: QueueManager::new(ignore.clone()),
            ignore,
            extractors: Arc::new(ExtractorRegistry::default()),
            thresholds: Arc::new(Thresholds::default()),
            handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Prepare state directories and attach a native watcher for one folder.
fn attach_folder(shared: &SharedState, mut spec: FolderSpec) -> Result<()> {
    let metadata = sf_state::ensure_metadata(&spec.path, Some(&spec.prompt), chrono::Utc::now())
        .map_err(|e| crate::error::SupervisorError::StateInit(spec.path.clone(), e))?;
    spec.state_dir = sf_state::state_dir_for(&spec.path);
    spec.history_path = sf_state::history_path(&spec.path);
    tracing::info!(folder = %spec.path.display(), hash = %metadata.hash, "attaching folder watcher");

    let runtime = FolderRuntime {
        client: build_client(&spec.ai),
        ignore: shared.ignore.clone(),
        extractors: shared.extractors.clone(),
        thresholds: shared.thresholds.clone(),
        spec: spec.clone(),
    };

    let globs = build_globset(&spec.ignore_globs);
    let debounce = Duration::from_millis(spec.debounce_ms);
    let poll_interval = spec.poll_interval_ms.map(Duration::from_millis);
    let (mut rx, handle) = watch_folder(spec.path.clone(), globs, debounce, poll_interval);

    let queue = shared.queue.clone();
    let folder_root = spec.path.clone();
    tokio::spawn(async move {
        while let Some(path) = rx.recv().await {
            let runtime = runtime.clone();
            let path_for_job = path.clone();
            queue.enqueue(
                &folder_root,
                &path,
                Box::pin(async move {
                    process_file(runtime, path_for_job).await;
                }),
            );
        }
    });

    shared.handles.lock().unwrap().insert(spec.path.clone(), handle);
    Ok(())
}

fn detach_folder(shared: &SharedState, folder: &Path) {
    if let Some(handle) = shared.handles.lock().unwrap().remove(folder) {
        tracing::info!(folder = %folder.display(), "detaching folder watcher");
        handle.stop();
    }
}

/// Start the C12 discovery poller and react to `Added`/`Changed`/`Removed`
/// events by attaching or detaching folder watchers.
fn start_discovery(
    shared: SharedState,
    roots: Vec<PathBuf>,
    interval_ms: u64,
    defaults: FolderDefaults,
) -> tokio::sync::oneshot::Sender<()> {
    let globs = build_globset(&[
        "**/node_modules/**".to_string(),
        "**/.git/**".to_string(),
        "**/.smartfolder/**".to_string(),
    ]);
    let (mut rx, stop) = sf_watch::run_discovery(roots, globs, Duration::from_millis(interval_ms));

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                DiscoveryEvent::Added { path, prompt } | DiscoveryEvent::Changed { path, prompt } => {
                    let Some(folder) = path.parent() else { continue };
                    let spec = sf_config::folder_spec_from_discovery(folder.to_path_buf(), prompt, &defaults);
                    if let Err(err) = attach_folder(&shared, spec) {
                        tracing::error!(folder = %folder.display(), error = %err, "failed to attach discovered folder");
                    }
                }
                DiscoveryEvent::Removed { path } => {
                    if let Some(folder) = path.parent() {
                        detach_folder(&shared, folder);
                    }
                }
            }
        }
    });

    stop
}

/// Wait for SIGINT or (on unix) SIGTERM.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Close discovery and every folder's watcher, then await every folder
/// queue's worker so an in-flight job finishes before this returns
/// (`spec.md` §4.14/§5: "let current jobs run to completion, then exit").
async fn shutdown(shared: &SharedState, discovery_stop: Option<tokio::sync::oneshot::Sender<()>>) {
    if let Some(stop) = discovery_stop {
        let _ = stop.send(());
    }
    let handles: Vec<_> = shared.handles.lock().unwrap().drain().map(|(_, h)| h).collect();
    for handle in handles {
        handle.stop();
    }
    shared.queue.shutdown().await;
}

/// Run the supervisor to completion: attach every folder (static list or
/// discovery-driven), then either wait for a shutdown signal or, in
/// `run_once` mode, return immediately once every watcher is attached
/// (`spec.md` §9's locked-in decision — watchers start, then the process
/// exits without processing any events).
pub async fn run(config: NormalizedConfig, run_once: bool) -> Result<()> {
    let shared = SharedState::new();
    let mut discovery_stop = None;

    match config {
        NormalizedConfig::Folders(specs) => {
            for spec in specs {
                attach_folder(&shared, spec)?;
            }
        }
        NormalizedConfig::RootDirectories { roots, discovery_interval_ms, defaults } => {
            discovery_stop = Some(start_discovery(shared.clone(), roots, discovery_interval_ms, defaults));
        }
    }

    if run_once {
        shutdown(&shared, discovery_stop).await;
        return Ok(());
    }

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, closing watchers and draining in-flight jobs");
    shutdown(&shared, discovery_stop).await;
    Ok(())
}

/// Load a config file and run the supervisor (the `run` CLI subcommand).
pub async fn run_from_config_file(path: &Path, overrides: &CliOverrides, run_once: bool) -> Result<()> {
    let config = sf_config::load_and_normalize(path, overrides)?;
    run(config, run_once).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_config::{AiSettings, ToolId};

    #[tokio::test]
    async fn run_once_attaches_and_returns_without_blocking() {
        let dir = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("SMARTFOLDER_HOME", dir.path().join(".smartfolder"));
        }

        let watched = dir.path().join("watched");
        std::fs::create_dir(&watched).unwrap();

        let spec = FolderSpec {
            path: watched,
            prompt: "organize".into(),
            tools: ToolId::ALL.to_vec(),
            ignore_globs: vec![],
            debounce_ms: 1500,
            poll_interval_ms: Some(50),
            env: Default::default(),
            dry_run: true,
            ai: AiSettings::default(),
            state_dir: PathBuf::new(),
            history_path: PathBuf::new(),
        };

        let result = tokio::time::timeout(Duration::from_secs(5), run(NormalizedConfig::Folders(vec![spec]), true)).await;
        assert!(result.is_ok());
    }

    /// S6: discovering a `smartfolder.md` attaches a watcher on its parent
    /// folder with the file's body as the prompt; deleting the config file
    /// detaches it again.
    #[tokio::test]
    async fn discovery_attaches_and_detaches_folder_watchers() {
        let dir = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("SMARTFOLDER_HOME", dir.path().join(".smartfolder"));
        }

        let root = dir.path().join("root");
        let project = root.join("proj");
        std::fs::create_dir_all(&project).unwrap();
        let config_path = project.join("smartfolder.md");
        std::fs::write(&config_path, "organize").unwrap();

        let shared = SharedState::new();
        let defaults = FolderDefaults {
            tools: ToolId::ALL.to_vec(),
            ignore_globs: vec![],
            debounce_ms: 1500,
            poll_interval_ms: Some(50),
            env: Default::default(),
            dry_run: true,
            ai: AiSettings::default(),
        };
        let stop = start_discovery(shared.clone(), vec![root], 20, defaults);

        let attached = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if shared.handles.lock().unwrap().contains_key(&project) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(attached.is_ok(), "expected a watcher to attach to {project:?} within one tick");

        std::fs::remove_file(&config_path).unwrap();

        let detached = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if !shared.handles.lock().unwrap().contains_key(&project) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(detached.is_ok(), "expected the watcher on {project:?} to detach after config removal");

        let _ = stop.send(());
    }
}
