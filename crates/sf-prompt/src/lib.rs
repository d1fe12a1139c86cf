// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Content strategy and prompt assembly (C5/C6).

pub mod builder;
pub mod content_strategy;
pub mod thresholds;

pub use builder::{system_prompt, user_message};
pub use content_strategy::{build_file_content, Body, BodyMode, ContentStrategy, FileContent};
pub use thresholds::Thresholds;
