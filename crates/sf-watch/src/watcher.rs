// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! One watcher per folder (C11): native FS events with a debounce window,
//! falling back to polling where native events are unreliable.

use globset::GlobSet;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::ignore::is_ignored;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Notify(#[from] notify::Error),
}

/// Keeps the native watcher and background tasks alive; dropping it stops
/// the folder's event pipeline.
pub struct WatcherHandle {
    _watcher: Option<RecommendedWatcher>,
    stop: Option<tokio::sync::oneshot::Sender<()>>,
}

impl WatcherHandle {
    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Start watching `folder` for file additions, emitting each add's absolute
/// path on the returned channel once it has been stable for `debounce` and
/// doesn't match `ignore_globs`. Depth is one level (`spec.md` §4.11).
pub fn watch_folder(
    folder: PathBuf,
    ignore_globs: GlobSet,
    debounce: Duration,
    poll_interval: Option<Duration>,
) -> (mpsc::UnboundedReceiver<PathBuf>, WatcherHandle) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();

    if let Some(poll_interval) = poll_interval {
        tokio::spawn(poll_loop(folder, ignore_globs, poll_interval, out_tx, stop_rx));
        return (out_rx, WatcherHandle { _watcher: None, stop: Some(stop_tx) });
    }

    let (raw_tx, raw_rx) = std::sync::mpsc::channel::<notify::Result<Event>>();
    let watcher = RecommendedWatcher::new(
        move |res| {
            let _ = raw_tx.send(res);
        },
        notify::Config::default(),
    );

    let watcher = match watcher {
        Ok(mut watcher) => {
            if let Err(err) = watcher.watch(&folder, RecursiveMode::NonRecursive) {
                tracing::warn!(folder = %folder.display(), error = %err, "failed to start native watcher");
            }
            Some(watcher)
        }
        Err(err) => {
            tracing::warn!(folder = %folder.display(), error = %err, "failed to construct native watcher");
            None
        }
    };

    tokio::spawn(debounce_loop(folder, ignore_globs, debounce, raw_rx, out_tx, stop_rx));

    (out_rx, WatcherHandle { _watcher: watcher, stop: Some(stop_tx) })
}

async fn debounce_loop(
    folder: PathBuf,
    ignore_globs: GlobSet,
    debounce: Duration,
    raw_rx: std::sync::mpsc::Receiver<notify::Result<Event>>,
    out_tx: mpsc::UnboundedSender<PathBuf>,
    mut stop_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = tick.tick() => {
                while let Ok(res) = raw_rx.try_recv() {
                    match res {
                        Ok(event) => handle_event(&folder, &ignore_globs, event, &mut pending),
                        Err(err) => tracing::warn!(folder = %folder.display(), error = %err, "watch error"),
                    }
                }

                let now = Instant::now();
                let ready: Vec<PathBuf> = pending
                    .iter()
                    .filter(|(_, last_seen)| now.duration_since(**last_seen) >= debounce)
                    .map(|(path, _)| path.clone())
                    .collect();

                for path in ready {
                    pending.remove(&path);
                    if out_tx.send(path).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

fn handle_event(folder: &Path, ignore_globs: &GlobSet, event: Event, pending: &mut HashMap<PathBuf, Instant>) {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }
    for path in event.paths {
        if path.parent() != Some(folder) {
            continue;
        }
        if is_ignored(ignore_globs, &path) {
            continue;
        }
        pending.insert(path, Instant::now());
    }
}

async fn poll_loop(
    folder: PathBuf,
    ignore_globs: GlobSet,
    poll_interval: Duration,
    out_tx: mpsc::UnboundedSender<PathBuf>,
    mut stop_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let mut seen: HashSet<PathBuf> = list_entries(&folder);
    let mut interval = tokio::time::interval(poll_interval);

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = interval.tick() => {
                let current = list_entries(&folder);
                for path in current.difference(&seen) {
                    if is_ignored(&ignore_globs, path) {
                        continue;
                    }
                    if out_tx.send(path.clone()).is_err() {
                        return;
                    }
                }
                seen = current;
            }
        }
    }
}

fn list_entries(folder: &Path) -> HashSet<PathBuf> {
    std::fs::read_dir(folder)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .map(|entry| entry.path())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::build_globset;

    #[tokio::test]
    async fn poll_loop_reports_only_newly_appeared_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("existing.txt"), b"x").unwrap();

        let (mut rx, handle) = watch_folder(
            dir.path().to_path_buf(),
            build_globset(&[]),
            Duration::from_millis(50),
            Some(Duration::from_millis(30)),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::write(dir.path().join("new.txt"), b"y").unwrap();

        let found = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "new.txt");
        handle.stop();
    }
}
