// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to prepare state directory for {0}: {1}")]
    StateInit(PathBuf, #[source] sf_state::StateError),

    #[error(transparent)]
    Config(#[from] sf_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
