// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Self-change suppressor (C10): tracks paths a mutating tool recently
//! touched so the watcher doesn't re-enqueue a job for its own writes.
//!
//! Grounded on the §9 redesign guidance: a `{path -> deadline}` map swept on
//! probe rather than driven by a per-entry timer task.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a mutation keeps its target out of the watch pipeline.
pub const IGNORE_WINDOW: Duration = Duration::from_secs(10);

#[derive(Default)]
pub struct SelfChangeTracker {
    entries: Mutex<HashMap<PathBuf, Instant>>,
}

impl SelfChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` was just mutated by a tool; resets any existing
    /// deadline rather than stacking windows.
    pub fn mark(&self, path: &Path) {
        let deadline = Instant::now() + IGNORE_WINDOW;
        self.entries.lock().unwrap().insert(path.to_path_buf(), deadline);
    }

    /// Returns true iff `path` is still within its ignore window. Expired
    /// entries are dropped as a side effect (sweep-on-probe).
    pub fn is_ignored(&self, path: &Path) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(deadline) if *deadline > Instant::now() => true,
            Some(_) => {
                entries.remove(path);
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshly_marked_path_is_ignored() {
        let tracker = SelfChangeTracker::new();
        let path = PathBuf::from("/tmp/dl/a.pdf");
        tracker.mark(&path);
        assert!(tracker.is_ignored(&path));
    }

    #[test]
    fn unmarked_path_is_not_ignored() {
        let tracker = SelfChangeTracker::new();
        assert!(!tracker.is_ignored(Path::new("/tmp/dl/never-touched.txt")));
    }

    #[test]
    fn re_marking_replaces_the_existing_deadline() {
        let tracker = SelfChangeTracker::new();
        let path = PathBuf::from("/tmp/dl/a.pdf");
        tracker.mark(&path);
        tracker.mark(&path);
        assert!(tracker.is_ignored(&path));
    }
}
