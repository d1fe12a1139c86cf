// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Model capability selection and the model-facing wire contract (C4).

pub mod capability;
pub mod client;
pub mod error;

pub use capability::{select, Capability, DEFAULT_CAPABILITY_ID, REGISTRY};
pub use client::{ModelClient, ModelMessage, ModelStep, OpenAiModelClient, ToolCall, ToolDef, ToolResult, UserContent};
pub use error::{ModelError, Result};

#[cfg(any(test, feature = "test-util"))]
pub use client::mock::MockModelClient;
