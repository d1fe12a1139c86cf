// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Extension/mime -> category classification (C2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Text,
    Code,
    Data,
    Image,
    Pdf,
    Audio,
    Video,
    Office,
    Archive,
    Folder,
}

const CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "tsx", "jsx", "go", "java", "c", "cpp", "h", "hpp", "cs", "rb", "php",
    "swift", "kt", "scala", "sh", "bash", "zsh", "lua", "pl", "sql",
];

const DATA_EXTENSIONS: &[&str] = &["csv", "tsv", "json", "jsonl", "yaml", "yml", "toml", "xml", "ndjson"];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg", "heic", "tiff"];

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a", "aac"];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

const OFFICE_EXTENSIONS: &[&str] = &["doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp"];

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz", "bz2", "7z", "rar", "xz"];

/// Classify a file by its final extension (multi-dot names use the last
/// segment, e.g. `archive.tar.gz` -> `ARCHIVE` via `gz`) and, when present,
/// an authoritative mime type. Mime prefixes short-circuit the extension
/// table per `spec.md` §4.2.
pub fn classify(extension_lower: Option<&str>, mime: Option<&str>) -> Category {
    if let Some(mime) = mime {
        if mime.starts_with("image/") {
            return Category::Image;
        }
        if mime.starts_with("video/") {
            return Category::Video;
        }
        if mime.starts_with("audio/") {
            return Category::Audio;
        }
        if mime.starts_with("text/") {
            return Category::Text;
        }
        if mime == "application/pdf" {
            return Category::Pdf;
        }
    }

    let Some(ext) = extension_lower else {
        return Category::Text;
    };

    if ext == "pdf" {
        Category::Pdf
    } else if CODE_EXTENSIONS.contains(&ext) {
        Category::Code
    } else if DATA_EXTENSIONS.contains(&ext) {
        Category::Data
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        Category::Image
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        Category::Audio
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Category::Video
    } else if OFFICE_EXTENSIONS.contains(&ext) {
        Category::Office
    } else if ARCHIVE_EXTENSIONS.contains(&ext) {
        Category::Archive
    } else {
        Category::Text
    }
}

/// Extract the classification extension from a file name, honoring the
/// multi-dot rule (final extension wins).
pub fn final_extension(file_name: &str) -> Option<String> {
    file_name.rsplit('.').next().map(|s| s.to_lowercase()).filter(|ext| ext.as_str() != file_name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_dot_name_uses_final_extension() {
        assert_eq!(final_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(classify(final_extension("archive.tar.gz").as_deref(), None), Category::Archive);
    }

    #[test]
    fn unknown_extension_defaults_to_text() {
        assert_eq!(classify(Some("xyz123"), None), Category::Text);
    }

    #[test]
    fn mime_prefix_short_circuits_extension_table() {
        assert_eq!(classify(Some("bin"), Some("image/png")), Category::Image);
    }

    #[test]
    fn pdf_extension_classified_as_pdf() {
        assert_eq!(classify(Some("pdf"), None), Category::Pdf);
    }

    #[test]
    fn no_extension_defaults_to_text() {
        assert_eq!(classify(None, None), Category::Text);
    }

    #[test]
    fn csv_classified_as_data() {
        assert_eq!(classify(Some("csv"), None), Category::Data);
    }
}
