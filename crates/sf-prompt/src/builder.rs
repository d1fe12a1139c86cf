// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Prompt builder (C6): system prompt wrapping + user message assembly from
//! a `FileContent`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sf_llm::UserContent;

use crate::content_strategy::{Body, FileContent};

const FIXED_SYSTEM_INSTRUCTIONS: &str = "\n\n\
Follow these rules at all times:\n\
1. Never guess missing information. If you are not confident about a fact, do not rename or move the file based on a guess.\n\
2. `write_file` is only for creating brand-new artifacts the user explicitly asked for; to rename an existing file, use `rename_file` instead.\n\
3. After any tool call succeeds, every subsequent call must refer to the file by the new name that tool call reported.";

/// Wrap the folder's own prompt with the fixed system-level instructions
/// every job's system message carries.
pub fn system_prompt(folder_prompt: &str) -> String {
    format!("{folder_prompt}{FIXED_SYSTEM_INSTRUCTIONS}")
}

fn metadata_section(content: &FileContent) -> String {
    let core = &content.core;
    let mut section = format!(
        "## File metadata\n\
         - Name: {}\n\
         - Path: {}\n\
         - Size: {}\n\
         - Category: {:?}\n",
        core.base_name,
        core.relative_path.display(),
        core.size_human,
        core.category,
    );
    if let Some(modified) = core.modified_at {
        section.push_str(&format!("- Modified: {modified}\n"));
    }
    section.push_str(&format!("- SHA-256: {}\n", core.sha256));
    section
}

fn typed_metadata_sections(content: &FileContent) -> String {
    let mut sections = String::new();
    if let Some(image) = &content.typed.image {
        sections.push_str(&format!("## Image metadata\n- Dimensions: {:?}x{:?}\n", image.width, image.height));
    }
    if let Some(pdf) = &content.typed.pdf {
        sections.push_str(&format!("## PDF metadata\n- Pages: {:?}\n- Title: {:?}\n", pdf.page_count, pdf.title));
    }
    if let Some(audio) = &content.typed.audio {
        sections.push_str(&format!("## Audio metadata\n- Duration (s): {:?}\n- Title: {:?}\n", audio.duration_seconds, audio.title));
    }
    if let Some(video) = &content.typed.video {
        sections.push_str(&format!("## Video metadata\n- Duration (s): {:?}\n- Codec: {:?}\n", video.duration_seconds, video.codec));
    }
    if let Some(archive) = &content.typed.archive {
        sections.push_str(&format!("## Archive metadata\n- Entry count: {:?}\n", archive.entry_count));
    }
    if let Some(data) = &content.typed.data {
        if let Some(header) = &data.header_row {
            sections.push_str(&format!("## CSV Header\n{}\n", header.join(",")));
        }
    }
    sections
}

fn body_section(body: &Body) -> String {
    match body {
        Body::None => "## Content\nContent was not included in this message; see metadata above.\n".to_string(),
        Body::FullText { utf8 } => format!("## Content (full)\n```\n{utf8}\n```\n"),
        Body::PartialText { head, tail, omitted_line_count, csv_header } => {
            let mut out = String::new();
            if let Some(header) = csv_header {
                out.push_str(&format!("## CSV Header\n{header}\n"));
            }
            out.push_str("## Content (partial — first 50 lines)\n```\n");
            out.push_str(&head.join("\n"));
            out.push_str(&format!("\n```\n[... {omitted_line_count} lines omitted ...]\n## Content (partial — last 50 lines)\n```\n"));
            out.push_str(&tail.join("\n"));
            out.push_str("\n```\n");
            out
        }
        Body::FullBinary { media_type, .. } => {
            format!("## Content\nAttached below as a {media_type} part.\n")
        }
    }
}

fn closing_instructions(content: &FileContent) -> String {
    format!(
        "## Available tools\n{}\n\n\
         ## Important\nAny rename must preserve the original extension. The exact original filename is `{}`.",
        content.available_tools.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", "),
        content.core.base_name,
    )
}

/// Assemble the user message `FileContent` drives. Returns plain text unless
/// the body is binary, in which case it returns the text-plus-part shape
/// the transport adapter encodes (`spec.md` §4.6).
pub fn user_message(content: &FileContent) -> UserContent {
    let text = format!(
        "{}\n{}\n{}\n\n{}",
        metadata_section(content),
        typed_metadata_sections(content),
        body_section(&content.body),
        closing_instructions(content),
    );

    match &content.body {
        Body::FullBinary { bytes, media_type } => UserContent::WithBinaryPart {
            text,
            media_type: media_type.clone(),
            base64_data: BASE64.encode(bytes),
        },
        _ => UserContent::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_config::ToolId;
    use sf_fs::{compute_core_meta, TypedMeta};

    #[test]
    fn system_prompt_includes_folder_prompt_and_fixed_rules() {
        let prompt = system_prompt("Rename files descriptively");
        assert!(prompt.starts_with("Rename files descriptively"));
        assert!(prompt.contains("Never guess missing information"));
        assert!(prompt.contains("rename_file"));
    }

    #[test]
    fn user_message_for_text_body_is_plain_text_and_names_the_original_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"x").unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        let content = crate::content_strategy::build_file_content(
            core,
            TypedMeta::default(),
            None,
            &crate::Thresholds::default(),
            false,
            &ToolId::ALL,
        );
        let message = user_message(&content);
        match message {
            UserContent::Text(text) => assert!(text.contains("a.pdf")),
            other => panic!("expected text content, got {other:?}"),
        }
    }

    #[test]
    fn user_message_for_binary_body_carries_a_separate_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, vec![0u8; 10]).unwrap();
        let core = compute_core_meta(dir.path(), &path).unwrap();
        let content = crate::content_strategy::build_file_content(
            core,
            TypedMeta::default(),
            Some("image/png"),
            &crate::Thresholds::default(),
            true,
            &ToolId::ALL,
        );
        let message = user_message(&content);
        assert!(matches!(message, UserContent::WithBinaryPart { .. }));
    }
}
