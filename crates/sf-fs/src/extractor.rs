// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Pluggable per-category metadata extractors.
//!
//! Grounded on the `AgentExecutor`-style trait shape in `ah-agents::traits`
//! (a small async-free trait with an availability check plus a single
//! fallible operation) adapted here for synchronous, best-effort extraction:
//! an extractor that can't do its job (missing codec data, corrupt header)
//! degrades to `None` rather than failing the whole metadata pass.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classifier::Category;

/// Extractor-contributed metadata, layered on top of `CoreMeta`. Each variant
/// corresponds to one or more `Category` values; absence of a field means the
/// extractor could not determine it (truncated header, unsupported codec,
/// password-protected archive, etc.) — never a hard error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypedMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMeta {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub taken_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfMeta {
    pub page_count: Option<u32>,
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMeta {
    pub duration_seconds: Option<f64>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMeta {
    pub duration_seconds: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveMeta {
    pub entry_count: Option<u64>,
    pub entry_names_sample: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataMeta {
    pub header_row: Option<Vec<String>>,
    pub row_count_sample: Option<u64>,
}

/// A single best-effort metadata extractor for one or more categories.
pub trait Extractor: Send + Sync {
    /// Categories this extractor knows how to handle.
    fn categories(&self) -> &'static [Category];

    /// Attempt extraction. Returns `Ok(None)` when the extractor recognizes
    /// the category but could not pull anything useful (e.g. corrupt file),
    /// and `Err` only for I/O failures reading the file itself.
    fn extract(&self, path: &Path) -> std::io::Result<Option<TypedMeta>>;
}

/// Registry of extractors consulted in order for a given category; the first
/// extractor that claims the category and returns `Some` wins.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self {
            extractors: vec![
                Box::new(ImageExtractor),
                Box::new(PdfExtractor),
                Box::new(AudioExtractor),
                Box::new(VideoExtractor),
                Box::new(ArchiveExtractor),
                Box::new(DataExtractor),
            ],
        }
    }
}

impl ExtractorRegistry {
    pub fn run(&self, category: Category, path: &Path) -> std::io::Result<Option<TypedMeta>> {
        for extractor in &self.extractors {
            if extractor.categories().contains(&category) {
                if let Some(meta) = extractor.extract(path)? {
                    return Ok(Some(meta));
                }
            }
        }
        Ok(None)
    }
}

/// Reads the first bytes of an image container for dimensions (PNG/JPEG
/// headers) without pulling in a full image-decoding dependency; anything
/// it can't parse degrades to `width`/`height` of `None`.
struct ImageExtractor;

impl Extractor for ImageExtractor {
    fn categories(&self) -> &'static [Category] {
        &[Category::Image]
    }

    fn extract(&self, path: &Path) -> std::io::Result<Option<TypedMeta>> {
        let bytes = std::fs::read(path)?;
        let dims = png_dimensions(&bytes).or_else(|| jpeg_dimensions(&bytes));
        let (width, height) = dims.unwrap_or((None, None));
        Ok(Some(TypedMeta {
            image: Some(ImageMeta {
                width,
                height,
                camera_make: None,
                camera_model: None,
                taken_at: None,
            }),
            ..Default::default()
        }))
    }
}

fn png_dimensions(bytes: &[u8]) -> Option<(Option<u32>, Option<u32>)> {
    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    if bytes.len() < 24 || &bytes[0..8] != PNG_SIGNATURE {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((Some(width), Some(height)))
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<(Option<u32>, Option<u32>)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }
    let mut i = 2;
    while i + 9 < bytes.len() {
        if bytes[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = bytes[i + 1];
        let is_sof = (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC;
        if is_sof {
            let height = u16::from_be_bytes([bytes[i + 5], bytes[i + 6]]) as u32;
            let width = u16::from_be_bytes([bytes[i + 7], bytes[i + 8]]) as u32;
            return Some((Some(width), Some(height)));
        }
        let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        i += 2 + len;
    }
    None
}

/// Counts `/Type /Page` occurrences in the raw PDF bytes as a page-count
/// proxy; doesn't attempt full object-stream decompression.
struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn categories(&self) -> &'static [Category] {
        &[Category::Pdf]
    }

    fn extract(&self, path: &Path) -> std::io::Result<Option<TypedMeta>> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let page_count = text.matches("/Type /Page").count() as u32;
        let title = extract_pdf_info_field(&text, "/Title");
        let author = extract_pdf_info_field(&text, "/Author");
        Ok(Some(TypedMeta {
            pdf: Some(PdfMeta {
                page_count: if page_count > 0 { Some(page_count) } else { None },
                title,
                author,
            }),
            ..Default::default()
        }))
    }
}

fn extract_pdf_info_field(text: &str, key: &str) -> Option<String> {
    let idx = text.find(key)?;
    let rest = &text[idx + key.len()..];
    let start = rest.find('(')? + 1;
    let end = rest[start..].find(')')? + start;
    Some(rest[start..end].to_string())
}

/// Audio/video containers are out of reach without a codec dependency;
/// these extractors report the category recognized but leave fields empty,
/// which is a valid "best effort" result per `spec.md` §4.3.
struct AudioExtractor;

impl Extractor for AudioExtractor {
    fn categories(&self) -> &'static [Category] {
        &[Category::Audio]
    }

    fn extract(&self, _path: &Path) -> std::io::Result<Option<TypedMeta>> {
        Ok(Some(TypedMeta {
            audio: Some(AudioMeta {
                duration_seconds: None,
                artist: None,
                title: None,
                album: None,
            }),
            ..Default::default()
        }))
    }
}

struct VideoExtractor;

impl Extractor for VideoExtractor {
    fn categories(&self) -> &'static [Category] {
        &[Category::Video]
    }

    fn extract(&self, _path: &Path) -> std::io::Result<Option<TypedMeta>> {
        Ok(Some(TypedMeta {
            video: Some(VideoMeta {
                duration_seconds: None,
                width: None,
                height: None,
                codec: None,
            }),
            ..Default::default()
        }))
    }
}

/// Reads the local-file-header signature count of a ZIP archive to estimate
/// entry count; other archive formats (tar.gz, 7z, rar) degrade to `None`.
struct ArchiveExtractor;

impl Extractor for ArchiveExtractor {
    fn categories(&self) -> &'static [Category] {
        &[Category::Archive]
    }

    fn extract(&self, path: &Path) -> std::io::Result<Option<TypedMeta>> {
        let bytes = std::fs::read(path)?;
        const ZIP_LOCAL_HEADER: &[u8] = &[0x50, 0x4b, 0x03, 0x04];
        let is_zip = bytes.len() >= 4 && &bytes[0..4] == ZIP_LOCAL_HEADER;
        let entry_count = if is_zip {
            Some(bytes.windows(4).filter(|w| *w == ZIP_LOCAL_HEADER).count() as u64)
        } else {
            None
        };
        Ok(Some(TypedMeta {
            archive: Some(ArchiveMeta {
                entry_count,
                entry_names_sample: Vec::new(),
            }),
            ..Default::default()
        }))
    }
}

/// Sniffs a CSV/TSV header row; JSON/YAML/TOML data files degrade to `None`.
struct DataExtractor;

impl Extractor for DataExtractor {
    fn categories(&self) -> &'static [Category] {
        &[Category::Data]
    }

    fn extract(&self, path: &Path) -> std::io::Result<Option<TypedMeta>> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "csv" && ext != "tsv" {
            return Ok(Some(TypedMeta {
                data: Some(DataMeta {
                    header_row: None,
                    row_count_sample: None,
                }),
                ..Default::default()
            }));
        }
        let delim = if ext == "tsv" { '\t' } else { ',' };
        let content = std::fs::read_to_string(path).unwrap_or_default();
        let mut lines = content.lines();
        let header_row = lines.next().map(|l| l.split(delim).map(|s| s.trim().to_string()).collect());
        let row_count_sample = Some(lines.take(1000).count() as u64);
        Ok(Some(TypedMeta {
            data: Some(DataMeta {
                header_row,
                row_count_sample,
            }),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_signature_yields_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let registry = ExtractorRegistry::default();
        let meta = registry.run(Category::Image, &path).unwrap().unwrap();
        assert_eq!(meta.image.unwrap().width, Some(1));
    }

    #[test]
    fn csv_header_row_is_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "name,age\nalice,30\nbob,40\n").unwrap();

        let registry = ExtractorRegistry::default();
        let meta = registry.run(Category::Data, &path).unwrap().unwrap();
        assert_eq!(meta.data.unwrap().header_row, Some(vec!["name".to_string(), "age".to_string()]));
    }

    #[test]
    fn unrecognized_archive_bytes_yield_no_entry_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.zip");
        std::fs::write(&path, b"not really a zip").unwrap();

        let registry = ExtractorRegistry::default();
        let meta = registry.run(Category::Archive, &path).unwrap().unwrap();
        assert_eq!(meta.archive.unwrap().entry_count, None);
    }
}
