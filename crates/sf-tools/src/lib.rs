// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The sandboxed tool vocabulary (C7): schema contracts, args validation,
//! and execution for the nine tools an agent loop may invoke.

pub mod error;
pub mod registry;
pub mod schema;

pub use error::{Result, ToolError};
pub use registry::{execute, ToolContext};
pub use schema::{description, to_model_tool_def, validate_args};
