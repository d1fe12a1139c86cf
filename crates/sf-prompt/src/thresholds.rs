// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-category body-inclusion thresholds (`spec.md` §4.5). All
//! configuration-overridable; `Default` gives the spec's literal values.

#[derive(Debug, Clone)]
pub struct Thresholds {
    pub text_full_max_bytes: u64,
    pub text_partial_max_bytes: u64,
    pub text_partial_head_lines: usize,
    pub text_partial_tail_lines: usize,
    pub image_max_bytes: u64,
    pub pdf_max_bytes: u64,
    pub audio_max_bytes: u64,
    pub video_max_bytes: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            text_full_max_bytes: 10 * 1024,
            text_partial_max_bytes: 100 * 1024,
            text_partial_head_lines: 50,
            text_partial_tail_lines: 50,
            image_max_bytes: 5 * 1024 * 1024,
            pdf_max_bytes: 10 * 1024 * 1024,
            audio_max_bytes: 10 * 1024 * 1024,
            video_max_bytes: 20 * 1024 * 1024,
        }
    }
}
