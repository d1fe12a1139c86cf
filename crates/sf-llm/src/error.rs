// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

/// Provider/gateway failures, wrapped with diagnostics per `spec.md` §4.8 so
/// the caller sees a plausible cause, not just a transport error string.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model provider error: {message} (possible causes: unsupported file type for this model, model misconfiguration, or an AI gateway outage)")]
    Provider { message: String },

    #[error("model returned a malformed tool call: {0}")]
    MalformedToolCall(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
