// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Append-only `history.jsonl` writer (C13). One JSON object per line;
//! append failures are logged but never fatal (`spec.md` §7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryRecord {
    pub fn success(file: impl Into<String>, timestamp: DateTime<Utc>, result: Value) -> Self {
        Self { timestamp, file: file.into(), result: Some(result), error: None }
    }

    pub fn failure(file: impl Into<String>, timestamp: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self { timestamp, file: file.into(), result: None, error: Some(error.into()) }
    }
}

/// Append one record to `history_path`, opening in append mode so
/// concurrent appenders to *different* folders' files never interleave
/// bytes. A write failure is logged and swallowed — history is diagnostic,
/// never load-bearing.
pub fn append_history(history_path: &Path, record: &HistoryRecord) {
    let line = match serde_json::to_string(record) {
        Ok(line) => line,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize history record");
            return;
        }
    };

    let result = (|| -> std::io::Result<()> {
        if let Some(parent) = history_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(history_path)?;
        writeln!(file, "{line}")
    })();

    if let Err(err) = result {
        tracing::warn!(error = %err, path = %history_path.display(), "failed to append history record");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn appended_records_parse_as_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        append_history(&path, &HistoryRecord::success("a.pdf", now, serde_json::json!({"renamed": true})));
        append_history(&path, &HistoryRecord::failure("b.pdf", now, "ProviderError"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let _: Value = serde_json::from_str(line).unwrap();
        }
    }

    #[test]
    fn history_path_parent_directories_are_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/history.jsonl");
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        append_history(&path, &HistoryRecord::success("a.txt", now, serde_json::json!({})));
        assert!(path.exists());
    }
}
