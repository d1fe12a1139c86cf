// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! One file's pipeline: classify + extract, select a capability, build
//! prompt content, drive the agent loop, persist the outcome to history.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sf_config::FolderSpec;
use sf_fs::{compute_core_meta, ExtractorRegistry, SelfChangeTracker};
use sf_llm::ModelClient;
use sf_prompt::{build_file_content, Thresholds};
use sf_tools::ToolContext;

/// Everything a running folder needs to process one newly-added file,
/// shared across every job dispatched for that folder.
#[derive(Clone)]
pub struct FolderRuntime {
    pub spec: FolderSpec,
    pub client: Arc<dyn ModelClient>,
    pub ignore: Arc<SelfChangeTracker>,
    pub extractors: Arc<ExtractorRegistry>,
    pub thresholds: Arc<Thresholds>,
}

/// Process one file end to end. Never returns an `Err` the caller must
/// react to — every failure becomes a `history.jsonl` error record instead
/// (`spec.md` §7: one job's failure never takes down the supervisor).
pub async fn process_file(runtime: FolderRuntime, path: PathBuf) {
    let relative = path
        .strip_prefix(&runtime.spec.path)
        .unwrap_or(&path)
        .to_string_lossy()
        .to_string();

    let outcome = run_pipeline(&runtime, &path).await;
    let now = chrono::Utc::now();

    match outcome {
        Ok(result_json) => {
            sf_state::append_history(
                &runtime.spec.history_path,
                &sf_state::HistoryRecord::success(relative, now, result_json),
            );
        }
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "job failed");
            sf_state::append_history(
                &runtime.spec.history_path,
                &sf_state::HistoryRecord::failure(relative, now, err),
            );
        }
    }
}

async fn run_pipeline(runtime: &FolderRuntime, path: &Path) -> Result<serde_json::Value, String> {
    let core = compute_core_meta(&runtime.spec.path, path).map_err(|e| e.to_string())?;
    let typed = runtime.extractors.run(core.category, path).unwrap_or(None).unwrap_or_default();
    let mime = mime_guess::from_path(path).first().map(|m| m.essence_str().to_string());

    let user_pref = format!("{}/{}", runtime.spec.ai.provider, runtime.spec.ai.model);
    let capability = sf_llm::select(core.category, core.size, Some(&user_pref));
    let model_supports_category = match core.category {
        sf_fs::Category::Image => capability.supports_image,
        sf_fs::Category::Pdf => capability.supports_pdf,
        sf_fs::Category::Audio => capability.supports_audio,
        sf_fs::Category::Video => capability.supports_video,
        _ => capability.supports_text,
    };

    let content = build_file_content(
        core,
        typed,
        mime.as_deref(),
        &runtime.thresholds,
        model_supports_category,
        &runtime.spec.tools,
    );

    let system_prompt = sf_prompt::system_prompt(&runtime.spec.prompt);
    let user_content = sf_prompt::user_message(&content);

    let ctx = ToolContext::new(runtime.spec.path.clone(), runtime.spec.dry_run, runtime.ignore.clone());

    let outcome = sf_agent::run(
        runtime.client.clone(),
        capability.id,
        system_prompt,
        user_content,
        &runtime.spec.tools,
        &ctx,
        runtime.spec.ai.max_tool_calls,
    )
    .await
    .map_err(|e| e.to_string())?;

    Ok(serde_json::json!({
        "capability": capability.id,
        "finalText": outcome.final_text,
        "toolResults": outcome.per_tool_results,
    }))
}
