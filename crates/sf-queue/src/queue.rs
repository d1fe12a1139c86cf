// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-folder serialized job queue (C9).
//!
//! Grounded on the task-handle-per-unit-of-work pattern used for launched
//! agent processes in `ah-core`: one channel-fed worker task per folder
//! stands in for the source's promise-chain, per the §9 redesign guidance.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use sf_fs::SelfChangeTracker;

pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct FolderWorker {
    sender: mpsc::UnboundedSender<Job>,
    handle: tokio::task::JoinHandle<()>,
}

impl FolderWorker {
    fn spawn() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let handle = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job.await;
            }
        });
        Self { sender, handle }
    }
}

/// Owns one worker per watched folder; `enqueue` is the single entry point
/// event producers (the watcher, discovery) call into.
#[derive(Clone)]
pub struct QueueManager {
    workers: Arc<Mutex<HashMap<PathBuf, FolderWorker>>>,
    ignore: Arc<SelfChangeTracker>,
}

impl QueueManager {
    pub fn new(ignore: Arc<SelfChangeTracker>) -> Self {
        Self {
            workers: Arc::new(Mutex::new(HashMap::new())),
            ignore,
        }
    }

    /// Enqueue `job` for `folder`, keyed for ordering against `path`'s
    /// ignore status. Drops the job (logged at debug) if `path` is
    /// currently self-change-suppressed; jobs for the same folder otherwise
    /// run strictly in arrival order, one at a time.
    pub fn enqueue(&self, folder: &Path, path: &Path, job: Job) {
        if self.ignore.is_ignored(path) {
            tracing::debug!(path = %path.display(), "dropping event for self-change-suppressed path");
            return;
        }

        let mut workers = self.workers.lock().unwrap();
        let worker = workers.entry(folder.to_path_buf()).or_insert_with(FolderWorker::spawn);
        if worker.sender.send(job).is_err() {
            tracing::warn!(folder = %folder.display(), "folder worker channel closed; respawning");
            let respawned = FolderWorker::spawn();
            // Best-effort: if the fresh worker can't accept either, the job is dropped and logged.
            if let Err(_job) = respawned.sender.send(Box::pin(async {})) {
                tracing::warn!(folder = %folder.display(), "failed to respawn folder worker");
            }
            *worker = respawned;
        }
    }

    pub fn active_folder_count(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    /// Close every folder's queue and wait for its worker to drain
    /// (including a job that's already mid-flight) before returning.
    /// `spec.md` §4.14/§5: shutdown lets current jobs run to completion.
    pub async fn shutdown(&self) {
        let workers: Vec<FolderWorker> = self.workers.lock().unwrap().drain().map(|(_, w)| w).collect();
        for worker in workers {
            drop(worker.sender);
            if let Err(err) = worker.handle.await {
                tracing::warn!(error = %err, "folder worker task panicked during shutdown");
            }
        }
    }
}
