// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-folder serialized job queue (C9). The self-change suppressor (C10)
//! lives in `sf_fs::SelfChangeTracker`, shared between this crate's intake
//! check and the mutating tools that write to it.

pub mod queue;

pub use queue::{Job, QueueManager};
