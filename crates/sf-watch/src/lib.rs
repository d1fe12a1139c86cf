// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Folder watching (C11) and smart-folder discovery (C12).

pub mod discovery;
pub mod ignore;
pub mod watcher;

pub use discovery::{
    diff, parse_config_file, run_discovery, scan_once, DiscoveryError, DiscoveryEvent,
    CONFIG_FILE_NAME, MAX_CONFIG_BYTES, MAX_PROMPT_CHARS,
};
pub use ignore::{build_globset, is_ignored};
pub use watcher::{watch_folder, WatchError, WatcherHandle};
