// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Glob-based ignore matching shared by the folder watcher and discovery.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

pub fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => {
                tracing::warn!(pattern, error = %err, "ignoring malformed glob pattern");
            }
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}

pub fn is_ignored(set: &GlobSet, path: &Path) -> bool {
    set.is_match(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_double_star_glob() {
        let set = build_globset(&["**/node_modules/**".to_string()]);
        assert!(is_ignored(&set, Path::new("proj/node_modules/pkg/index.js")));
    }

    #[test]
    fn non_matching_path_is_not_ignored() {
        let set = build_globset(&["**/.git/**".to_string()]);
        assert!(!is_ignored(&set, Path::new("proj/src/main.rs")));
    }
}
