// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The nine sandboxed tools (C7) and the registry that dispatches,
//! validates, and logs every invocation.

use serde_json::{json, Value};
use sf_config::ToolId;
use sf_fs::{classify, contain, ensure_parent_dir, final_extension, read_capped, Category, SelfChangeTracker, MAX_READ_BYTES};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Result, ToolError};
use crate::schema::{self, GrepArgs, HeadArgs, MoveFileArgs, ReadFileArgs, RenameFileArgs, SedArgs, TailArgs, WriteFileArgs};

const DEFAULT_HEAD_TAIL_LINES: u32 = 10;
const GREP_MAX_MATCHES: usize = 100;

pub struct ToolContext {
    pub folder_root: PathBuf,
    pub dry_run: bool,
    pub ignore: Arc<SelfChangeTracker>,
}

impl ToolContext {
    pub fn new(folder_root: PathBuf, dry_run: bool, ignore: Arc<SelfChangeTracker>) -> Self {
        Self { folder_root, dry_run, ignore }
    }
}

fn is_binary_path(path: &Path) -> bool {
    let ext = path.file_name().and_then(|n| n.to_str()).and_then(final_extension);
    !matches!(classify(ext.as_deref(), None), Category::Text | Category::Code | Category::Data)
}

fn relative_display(ctx: &ToolContext, abs: &Path) -> String {
    abs.strip_prefix(&ctx.folder_root).unwrap_or(abs).to_string_lossy().to_string()
}

/// Execute one tool call against the sandbox, returning `{ok, payload_json}`.
/// Tool failures never propagate as `Err` out of this function — only
/// arg-validation failures do, since those indicate a malformed call the
/// driver should surface distinctly.
pub fn execute(tool: ToolId, args: &Value, ctx: &ToolContext) -> Result<Value> {
    schema::validate_args(tool, args)?;
    let start = Instant::now();

    let outcome = match tool {
        ToolId::ReadFile => read_file(args, ctx),
        ToolId::WriteFile => write_file(args, ctx),
        ToolId::RenameFile => rename_file(args, ctx),
        ToolId::MoveFile => move_file(args, ctx),
        ToolId::Grep => grep(args, ctx),
        ToolId::Sed => sed(args, ctx),
        ToolId::Head => head(args, ctx),
        ToolId::Tail => tail(args, ctx),
        ToolId::CreateFolder => create_folder(args, ctx),
    };

    let duration_ms = start.elapsed().as_millis();
    let (ok, payload) = match outcome {
        Ok(payload) => (true, payload),
        Err(err) => (false, json!({"error": err.to_string()})),
    };

    tracing::info!(
        tool = tool.as_str(),
        duration_ms,
        success = ok,
        "tool invocation"
    );

    Ok(json!({"ok": ok, "payload_json": payload}))
}

fn dry_run_skip() -> Value {
    json!({"skipped": true, "reason": "dry_run"})
}

fn read_file(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: ReadFileArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "read_file", message: e.to_string() })?;
    let abs = contain(&ctx.folder_root, Path::new(&args.path)).map_err(|_| ToolError::PathEscape)?;
    if is_binary_path(&abs) {
        return Err(ToolError::BinaryToolMisuse { tool: "read_file", path: abs });
    }
    let bytes = read_capped(&abs, MAX_READ_BYTES).map_err(|e| match e {
        sf_fs::SandboxError::SizeExceeded { max_bytes, actual } => ToolError::SizeExceeded { max_bytes, actual },
        sf_fs::SandboxError::NotRegularFile(p) => ToolError::Missing(p),
        sf_fs::SandboxError::Io(io) => ToolError::Io(io),
        _ => ToolError::Missing(abs.clone()),
    })?;
    let preview = String::from_utf8_lossy(&bytes).to_string();
    Ok(json!({"tool": "read_file", "target": relative_display(ctx, &abs), "bytes": bytes.len(), "preview": preview}))
}

fn write_file(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: WriteFileArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "write_file", message: e.to_string() })?;
    let abs = contain(&ctx.folder_root, Path::new(&args.path)).map_err(|_| ToolError::PathEscape)?;
    if is_binary_path(&abs) {
        return Err(ToolError::BinaryToolMisuse { tool: "write_file", path: abs });
    }
    if ctx.dry_run {
        return Ok(dry_run_skip());
    }
    if abs.exists() {
        return Err(ToolError::AlreadyExists(abs));
    }
    ensure_parent_dir(&abs)?;
    std::fs::write(&abs, &args.contents)?;
    ctx.ignore.mark(&abs);
    Ok(json!({"tool": "write_file", "target": relative_display(ctx, &abs), "created": true}))
}

fn check_extension_preserved(from: &Path, to: &Path) -> Result<()> {
    let from_ext = from.file_name().and_then(|n| n.to_str()).and_then(final_extension);
    let to_ext = to.file_name().and_then(|n| n.to_str()).and_then(final_extension);
    if from_ext != to_ext {
        let suggested = match &from_ext {
            Some(ext) => to.with_extension(ext),
            None => to.to_path_buf(),
        };
        return Err(ToolError::ExtensionMismatch {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            suggested,
        });
    }
    Ok(())
}

fn rename_file(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: RenameFileArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "rename_file", message: e.to_string() })?;
    let from = contain(&ctx.folder_root, Path::new(&args.from)).map_err(|_| ToolError::PathEscape)?;
    let to = contain(&ctx.folder_root, Path::new(&args.to)).map_err(|_| ToolError::PathEscape)?;

    if ctx.dry_run {
        return Ok(dry_run_skip());
    }
    if !from.exists() {
        return Err(ToolError::Missing(from));
    }
    if to.exists() {
        return Err(ToolError::AlreadyExists(to));
    }
    check_extension_preserved(&from, &to)?;

    ensure_parent_dir(&to)?;
    std::fs::rename(&from, &to)?;
    ctx.ignore.mark(&from);
    ctx.ignore.mark(&to);

    let old_name = from.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    let new_name = to.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    Ok(json!({
        "tool": "rename_file",
        "target": relative_display(ctx, &to),
        "renamed": true,
        "oldName": old_name,
        "newName": new_name,
        "message": format!("renamed {old_name} to {new_name}"),
    }))
}

fn move_file(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: MoveFileArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "move_file", message: e.to_string() })?;
    let from = contain(&ctx.folder_root, Path::new(&args.from)).map_err(|_| ToolError::PathEscape)?;
    let to = contain(&ctx.folder_root, Path::new(&args.to)).map_err(|_| ToolError::PathEscape)?;

    if ctx.dry_run {
        return Ok(dry_run_skip());
    }
    if !from.exists() {
        return Err(ToolError::Missing(from));
    }
    if to.exists() {
        return Err(ToolError::AlreadyExists(to));
    }
    if from.is_file() {
        check_extension_preserved(&from, &to)?;
    }

    ensure_parent_dir(&to)?;
    std::fs::rename(&from, &to)?;
    ctx.ignore.mark(&from);
    ctx.ignore.mark(&to);

    Ok(json!({
        "tool": "move_file",
        "target": relative_display(ctx, &to),
        "moved": true,
        "from": relative_display(ctx, &from),
        "to": relative_display(ctx, &to),
    }))
}

fn read_text_capped(abs: &Path) -> Result<String> {
    let bytes = read_capped(abs, MAX_READ_BYTES).map_err(|e| match e {
        sf_fs::SandboxError::SizeExceeded { max_bytes, actual } => ToolError::SizeExceeded { max_bytes, actual },
        sf_fs::SandboxError::NotRegularFile(p) => ToolError::Missing(p),
        sf_fs::SandboxError::Io(io) => ToolError::Io(io),
        _ => ToolError::Missing(abs.to_path_buf()),
    })?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

fn grep(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: GrepArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "grep", message: e.to_string() })?;
    let abs = contain(&ctx.folder_root, Path::new(&args.path)).map_err(|_| ToolError::PathEscape)?;
    if is_binary_path(&abs) {
        return Err(ToolError::BinaryToolMisuse { tool: "grep", path: abs });
    }
    let content = read_text_capped(&abs)?;
    let case_insensitive = args.case_insensitive.unwrap_or(false);
    let needle = if case_insensitive { args.pattern.to_lowercase() } else { args.pattern.clone() };

    let mut matches = Vec::new();
    let mut truncated = false;
    for (idx, line) in content.lines().enumerate() {
        let haystack = if case_insensitive { line.to_lowercase() } else { line.to_string() };
        if haystack.contains(&needle) {
            if matches.len() >= GREP_MAX_MATCHES {
                truncated = true;
                break;
            }
            matches.push(json!({"line": idx + 1, "content": line}));
        }
    }

    Ok(json!({"tool": "grep", "target": relative_display(ctx, &abs), "matches": matches, "truncated": truncated}))
}

fn sed(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: SedArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "sed", message: e.to_string() })?;
    let abs = contain(&ctx.folder_root, Path::new(&args.path)).map_err(|_| ToolError::PathEscape)?;
    if is_binary_path(&abs) {
        return Err(ToolError::BinaryToolMisuse { tool: "sed", path: abs });
    }
    let content = read_text_capped(&abs)?;

    let case_insensitive = args.case_insensitive.unwrap_or(false);
    let escaped = regex::escape(&args.find);
    let pattern = if case_insensitive { format!("(?i){escaped}") } else { escaped };
    let re = regex::Regex::new(&pattern).map_err(|e| ToolError::InvalidArgs { tool: "sed", message: e.to_string() })?;
    let replaced = re.replace_all(&content, regex::NoExpand(&args.replace)).to_string();

    let changed = replaced != content;
    if changed && !ctx.dry_run {
        std::fs::write(&abs, &replaced)?;
        ctx.ignore.mark(&abs);
    } else if changed && ctx.dry_run {
        return Ok(dry_run_skip());
    }

    Ok(json!({"tool": "sed", "target": relative_display(ctx, &abs), "changed": changed}))
}

fn head(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: HeadArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "head", message: e.to_string() })?;
    let abs = contain(&ctx.folder_root, Path::new(&args.path)).map_err(|_| ToolError::PathEscape)?;
    if is_binary_path(&abs) {
        return Err(ToolError::BinaryToolMisuse { tool: "head", path: abs });
    }
    let content = read_text_capped(&abs)?;
    let n = args.lines.unwrap_or(DEFAULT_HEAD_TAIL_LINES) as usize;
    let lines: Vec<&str> = content.lines().take(n).collect();
    Ok(json!({"tool": "head", "target": relative_display(ctx, &abs), "lines": lines}))
}

fn tail(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: TailArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "tail", message: e.to_string() })?;
    let abs = contain(&ctx.folder_root, Path::new(&args.path)).map_err(|_| ToolError::PathEscape)?;
    if is_binary_path(&abs) {
        return Err(ToolError::BinaryToolMisuse { tool: "tail", path: abs });
    }
    let content = read_text_capped(&abs)?;
    let n = args.lines.unwrap_or(DEFAULT_HEAD_TAIL_LINES) as usize;
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(n);
    Ok(json!({"tool": "tail", "target": relative_display(ctx, &abs), "lines": all[start..]}))
}

fn create_folder(args: &Value, ctx: &ToolContext) -> Result<Value> {
    let args: schema::CreateFolderArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidArgs { tool: "create_folder", message: e.to_string() })?;
    let abs = contain(&ctx.folder_root, Path::new(&args.path)).map_err(|_| ToolError::PathEscape)?;
    if ctx.dry_run {
        return Ok(dry_run_skip());
    }
    if abs.exists() {
        return Err(ToolError::AlreadyExists(abs));
    }
    std::fs::create_dir_all(&abs)?;
    ctx.ignore.mark(&abs);
    Ok(json!({"tool": "create_folder", "target": relative_display(ctx, &abs), "created": true}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(root: PathBuf, dry_run: bool) -> ToolContext {
        ToolContext::new(root, dry_run, Arc::new(SelfChangeTracker::new()))
    }

    #[test]
    fn read_file_outside_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(ToolId::ReadFile, &json!({"path": "../../etc/passwd"}), &ctx(dir.path().to_path_buf(), false)).unwrap();
        assert_eq!(result["ok"], json!(false));
    }

    #[test]
    fn write_file_refuses_to_overwrite_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "existing").unwrap();
        let result = execute(ToolId::WriteFile, &json!({"path": "a.txt", "contents": "new"}), &ctx(dir.path().to_path_buf(), false)).unwrap();
        assert_eq!(result["ok"], json!(false));
    }

    #[test]
    fn write_file_under_dry_run_is_skipped_and_does_not_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(ToolId::WriteFile, &json!({"path": "new.txt", "contents": "hi"}), &ctx(dir.path().to_path_buf(), true)).unwrap();
        assert_eq!(result["payload_json"]["skipped"], json!(true));
        assert!(!dir.path().join("new.txt").exists());
    }

    #[test]
    fn rename_file_rejects_extension_change() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"x").unwrap();
        let result = execute(ToolId::RenameFile, &json!({"from": "report.pdf", "to": "report"}), &ctx(dir.path().to_path_buf(), false)).unwrap();
        assert_eq!(result["ok"], json!(false));
    }

    #[test]
    fn rename_file_success_marks_both_paths_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        let tracker = Arc::new(SelfChangeTracker::new());
        let context = ToolContext::new(dir.path().to_path_buf(), false, tracker.clone());
        let result = execute(ToolId::RenameFile, &json!({"from": "a.pdf", "to": "b.pdf"}), &context).unwrap();
        assert_eq!(result["ok"], json!(true));
        assert!(tracker.is_ignored(&dir.path().join("b.pdf")));
    }

    #[test]
    fn sed_replaces_literal_occurrences_without_regex_interpretation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "price: $5.00 (was $5.00)").unwrap();
        let result = execute(
            ToolId::Sed,
            &json!({"path": "notes.txt", "find": "$5.00", "replace": "$6.00"}),
            &ctx(dir.path().to_path_buf(), false),
        )
        .unwrap();
        assert_eq!(result["payload_json"]["changed"], json!(true));
        let updated = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        assert_eq!(updated, "price: $6.00 (was $6.00)");
    }

    #[test]
    fn grep_caps_matches_at_one_hundred() {
        let dir = tempfile::tempdir().unwrap();
        let content = "needle\n".repeat(150);
        std::fs::write(dir.path().join("big.txt"), content).unwrap();
        let result = execute(ToolId::Grep, &json!({"path": "big.txt", "pattern": "needle"}), &ctx(dir.path().to_path_buf(), false)).unwrap();
        assert_eq!(result["payload_json"]["truncated"], json!(true));
        assert_eq!(result["payload_json"]["matches"].as_array().unwrap().len(), 100);
    }

    #[test]
    fn head_returns_first_n_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "a\nb\nc\nd\n").unwrap();
        let result = execute(ToolId::Head, &json!({"path": "f.txt", "lines": 2}), &ctx(dir.path().to_path_buf(), false)).unwrap();
        assert_eq!(result["payload_json"]["lines"], json!(["a", "b"]));
    }

    #[test]
    fn create_folder_fails_if_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let result = execute(ToolId::CreateFolder, &json!({"path": "sub"}), &ctx(dir.path().to_path_buf(), false)).unwrap();
        assert_eq!(result["ok"], json!(false));
    }
}
