// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The supervisor/orchestrator crate (C14): wires discovery and folder
//! watching into the job queue and the content/agent/tools pipeline.

pub mod error;
pub mod job;
pub mod supervisor;

pub use error::{Result, SupervisorError};
pub use job::{process_file, FolderRuntime};
pub use supervisor::{run, run_from_config_file};
