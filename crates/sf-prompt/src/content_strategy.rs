// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Content strategy (C5): the four-step template — metadata, gate, mode,
//! body — dispatched by `Category` rather than a class hierarchy, per the
//! §9 redesign guidance.

use sf_config::ToolId;
use sf_fs::{Category, CoreMeta, TypedMeta};
use std::fs;
use std::io;

use crate::thresholds::Thresholds;

#[derive(Debug, Clone, PartialEq)]
pub enum BodyMode {
    Full,
    Partial,
    None,
}

#[derive(Debug, Clone)]
pub enum Body {
    None,
    FullText { utf8: String },
    PartialText {
        head: Vec<String>,
        tail: Vec<String>,
        omitted_line_count: usize,
        csv_header: Option<String>,
    },
    FullBinary { bytes: Vec<u8>, media_type: String },
}

#[derive(Debug, Clone)]
pub struct FileContent {
    pub core: CoreMeta,
    pub typed: TypedMeta,
    pub body: Body,
    pub available_tools: Vec<ToolId>,
}

/// Text-like tools refuse binary extensions (C7); don't offer them for
/// categories that always route to `FullBinary`/`None`.
const TEXT_ONLY_TOOLS: &[ToolId] = &[ToolId::ReadFile, ToolId::Grep, ToolId::Sed, ToolId::Head, ToolId::Tail];

fn available_tools(category: Category, configured: &[ToolId]) -> Vec<ToolId> {
    let is_text_like = matches!(category, Category::Text | Category::Code | Category::Data);
    configured
        .iter()
        .copied()
        .filter(|t| is_text_like || !TEXT_ONLY_TOOLS.contains(t))
        .collect()
}

pub trait ContentStrategy {
    fn should_send_body(&self, meta: &CoreMeta, thresholds: &Thresholds) -> bool;
    fn choose_body_mode(&self, meta: &CoreMeta, thresholds: &Thresholds) -> BodyMode;
    fn fetch_body(&self, meta: &CoreMeta, mode: BodyMode, thresholds: &Thresholds, model_supports: bool) -> io::Result<Body>;
}

struct TextLikeStrategy;

impl ContentStrategy for TextLikeStrategy {
    fn should_send_body(&self, meta: &CoreMeta, thresholds: &Thresholds) -> bool {
        meta.size <= thresholds.text_partial_max_bytes
    }

    fn choose_body_mode(&self, meta: &CoreMeta, thresholds: &Thresholds) -> BodyMode {
        if meta.size <= thresholds.text_full_max_bytes {
            BodyMode::Full
        } else if meta.size <= thresholds.text_partial_max_bytes {
            BodyMode::Partial
        } else {
            BodyMode::None
        }
    }

    fn fetch_body(&self, meta: &CoreMeta, mode: BodyMode, thresholds: &Thresholds, _model_supports: bool) -> io::Result<Body> {
        match mode {
            BodyMode::None => Ok(Body::None),
            BodyMode::Full => {
                let content = fs::read_to_string(&meta.absolute_path).unwrap_or_default();
                Ok(Body::FullText { utf8: content })
            }
            BodyMode::Partial => {
                let content = fs::read_to_string(&meta.absolute_path).unwrap_or_default();
                let lines: Vec<&str> = content.lines().collect();
                let head_n = thresholds.text_partial_head_lines.min(lines.len());
                let tail_n = thresholds.text_partial_tail_lines.min(lines.len().saturating_sub(head_n));
                let head: Vec<String> = lines[..head_n].iter().map(|s| s.to_string()).collect();
                let tail_start = lines.len() - tail_n;
                let tail: Vec<String> = lines[tail_start..].iter().map(|s| s.to_string()).collect();
                let omitted_line_count = lines.len().saturating_sub(head_n + tail_n);

                let csv_header = if meta.extension.as_deref() == Some("csv") {
                    lines.first().map(|s| s.to_string())
                } else {
                    None
                };

                Ok(Body::PartialText { head, tail, omitted_line_count, csv_header })
            }
        }
    }
}

struct BinaryStrategy {
    max_bytes_of: fn(&Thresholds) -> u64,
    media_type: &'static str,
}

impl ContentStrategy for BinaryStrategy {
    fn should_send_body(&self, meta: &CoreMeta, thresholds: &Thresholds) -> bool {
        meta.size <= (self.max_bytes_of)(thresholds)
    }

    fn choose_body_mode(&self, meta: &CoreMeta, thresholds: &Thresholds) -> BodyMode {
        if self.should_send_body(meta, thresholds) {
            BodyMode::Full
        } else {
            BodyMode::None
        }
    }

    fn fetch_body(&self, meta: &CoreMeta, mode: BodyMode, _thresholds: &Thresholds, model_supports: bool) -> io::Result<Body> {
        if mode == BodyMode::None || !model_supports {
            return Ok(Body::None);
        }
        let bytes = fs::read(&meta.absolute_path)?;
        Ok(Body::FullBinary { bytes, media_type: self.media_type.to_string() })
    }
}

struct NoBodyStrategy;

impl ContentStrategy for NoBodyStrategy {
    fn should_send_body(&self, _meta: &CoreMeta, _thresholds: &Thresholds) -> bool {
        false
    }

    fn choose_body_mode(&self, _meta: &CoreMeta, _thresholds: &Thresholds) -> BodyMode {
        BodyMode::None
    }

    fn fetch_body(&self, _meta: &CoreMeta, _mode: BodyMode, _thresholds: &Thresholds, _model_supports: bool) -> io::Result<Body> {
        Ok(Body::None)
    }
}

fn strategy_for(category: Category) -> Box<dyn ContentStrategy> {
    match category {
        Category::Text | Category::Code | Category::Data => Box::new(TextLikeStrategy),
        Category::Image => Box::new(BinaryStrategy {
            max_bytes_of: |t| t.image_max_bytes,
            media_type: "image/*",
        }),
        Category::Pdf => Box::new(BinaryStrategy {
            max_bytes_of: |t| t.pdf_max_bytes,
            media_type: "application/pdf",
        }),
        Category::Audio => Box::new(BinaryStrategy {
            max_bytes_of: |t| t.audio_max_bytes,
            media_type: "audio/*",
        }),
        Category::Video => Box::new(BinaryStrategy {
            max_bytes_of: |t| t.video_max_bytes,
            media_type: "video/*",
        }),
        Category::Archive | Category::Folder | Category::Office => Box::new(NoBodyStrategy),
    }
}

/// Run the four-step template for one file, producing its `FileContent`.
pub fn build_file_content(
    core: CoreMeta,
    typed: TypedMeta,
    mime: Option<&str>,
    thresholds: &Thresholds,
    model_supports_category: bool,
    configured_tools: &[ToolId],
) -> FileContent {
    let strategy = strategy_for(core.category);
    let body = if strategy.should_send_body(&core, thresholds) {
        let mode = strategy.choose_body_mode(&core, thresholds);
        strategy.fetch_body(&core, mode, thresholds, model_supports_category).unwrap_or(Body::None)
    } else {
        Body::None
    };

    let body = match (&body, core.category, mime) {
        (Body::FullBinary { bytes, .. }, Category::Image, Some(mime)) => {
            Body::FullBinary { bytes: bytes.clone(), media_type: mime.to_string() }
        }
        _ => body,
    };

    FileContent {
        available_tools: available_tools(core.category, configured_tools),
        core,
        typed,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_fs::compute_core_meta;

    fn tools() -> Vec<ToolId> {
        ToolId::ALL.to_vec()
    }

    #[test]
    fn small_text_file_gets_full_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        let content = build_file_content(core, TypedMeta::default(), None, &Thresholds::default(), false, &tools());
        assert!(matches!(content.body, Body::FullText { .. }));
    }

    #[test]
    fn oversized_text_file_gets_no_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.txt");
        std::fs::write(&path, "x".repeat(200 * 1024)).unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        let content = build_file_content(core, TypedMeta::default(), None, &Thresholds::default(), false, &tools());
        assert!(matches!(content.body, Body::None));
    }

    #[test]
    fn mid_size_csv_preserves_header_in_partial_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        let mut content = String::from("id,name,email\n");
        for i in 0..5000 {
            content.push_str(&format!("{i},name{i},mail{i}@example.com\n"));
        }
        std::fs::write(&path, &content).unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        let file_content = build_file_content(core, TypedMeta::default(), None, &Thresholds::default(), false, &tools());
        match file_content.body {
            Body::PartialText { csv_header, head, tail, omitted_line_count } => {
                assert_eq!(csv_header.as_deref(), Some("id,name,email"));
                assert_eq!(head.len(), 50);
                assert_eq!(tail.len(), 50);
                assert!(omitted_line_count > 0);
            }
            other => panic!("expected partial text body, got {other:?}"),
        }
    }

    #[test]
    fn image_within_limit_becomes_full_binary_when_model_supports_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, vec![0u8; 1024]).unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        let content = build_file_content(core, TypedMeta::default(), Some("image/png"), &Thresholds::default(), true, &tools());
        assert!(matches!(content.body, Body::FullBinary { .. }));
    }

    #[test]
    fn archive_category_never_sends_a_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        std::fs::write(&path, b"PK\x03\x04").unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        let content = build_file_content(core, TypedMeta::default(), None, &Thresholds::default(), true, &tools());
        assert!(matches!(content.body, Body::None));
    }

    #[test]
    fn binary_categories_exclude_text_only_tools() {
        assert!(!available_tools(Category::Image, &tools()).contains(&ToolId::ReadFile));
        assert!(available_tools(Category::Text, &tools()).contains(&ToolId::ReadFile));
    }
}
