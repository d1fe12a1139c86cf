// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("path escapes the watched folder")]
    PathEscape,

    #[error("file exceeds the {max_bytes}-byte cap ({actual} bytes)")]
    SizeExceeded { max_bytes: u64, actual: u64 },

    #[error("renaming {from:?} to {to:?} would change the file extension; try {suggested:?}")]
    ExtensionMismatch { from: PathBuf, to: PathBuf, suggested: PathBuf },

    #[error("path already exists: {0:?}")]
    AlreadyExists(PathBuf),

    #[error("path does not exist: {0:?}")]
    Missing(PathBuf),

    #[error("{tool} only operates on text files; {path:?} is already attached to the model as binary content")]
    BinaryToolMisuse { tool: &'static str, path: PathBuf },

    #[error("invalid arguments for tool {tool}: {message}")]
    InvalidArgs { tool: &'static str, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;
