// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?} as JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config schema validation failed:\n  - {0}")]
    SchemaInvalid(String),

    #[error("exactly one of `folders` and `rootDirectories` must be set, got {got}")]
    FoldersXorRoots { got: &'static str },

    #[error("environment variable `{0}` is not in the allowed whitelist")]
    EnvVarNotAllowed(String),

    #[error("unknown tool id `{0}`")]
    UnknownTool(String),

    #[error("folder path `{0}` is not valid")]
    InvalidFolderPath(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
