// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] sf_llm::ModelError),

    #[error("unknown tool id in model response: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    ToolExecution(#[from] sf_tools::ToolError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
