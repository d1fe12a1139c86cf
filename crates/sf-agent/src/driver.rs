// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bounded multi-turn agent loop (C8): drives one job's exchange between
//! the model and the tool registry to completion or the step cap.

use sf_config::ToolId;
use sf_llm::{ModelClient, ModelMessage, ModelStep, ToolCall, ToolDef, ToolResult, UserContent};
use sf_tools::ToolContext;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Final shape the driver returns (`spec.md` §4.8).
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub final_text: String,
    pub per_tool_results: Vec<ToolResult>,
}

fn build_tool_defs(tools: &[ToolId]) -> Vec<ToolDef> {
    tools
        .iter()
        .map(|tool| {
            let (name, description, parameters) = sf_tools::to_model_tool_def(*tool);
            ToolDef { name, description, parameters }
        })
        .collect()
}

fn execute_tool_call(call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult> {
    let tool = ToolId::parse(&call.tool_id).map_err(|_| AgentError::UnknownTool(call.tool_id.clone()))?;
    let result = sf_tools::execute(tool, &call.args, ctx)?;

    Ok(ToolResult {
        tool_call_id: call.id.clone(),
        tool_id: call.tool_id.clone(),
        ok: result["ok"].as_bool().unwrap_or(false),
        payload_json: result["payload_json"].clone(),
    })
}

/// Run the bounded loop for a single job.
///
/// `max_tool_calls` is the step cap `S`: the loop performs at most that many
/// model round-trips before returning whatever text/results it has so far.
pub async fn run(
    client: Arc<dyn ModelClient>,
    model_id: &str,
    system_prompt: String,
    user_content: UserContent,
    tools: &[ToolId],
    ctx: &ToolContext,
    max_tool_calls: u32,
) -> Result<AgentOutcome> {
    let tool_defs = build_tool_defs(tools);
    let mut messages = vec![
        ModelMessage::System { content: system_prompt },
        ModelMessage::User { content: user_content },
    ];
    let mut per_tool_results = Vec::new();

    for step in 0..max_tool_calls.max(1) {
        let outcome = client.step(model_id, &messages, &tool_defs).await?;

        match outcome {
            ModelStep::FinalText(text) => {
                return Ok(AgentOutcome { final_text: text, per_tool_results });
            }
            ModelStep::ToolCalls(calls) => {
                messages.push(ModelMessage::Assistant { content: None, tool_calls: calls.clone() });

                for call in &calls {
                    let result = match execute_tool_call(call, ctx) {
                        Ok(result) => result,
                        Err(err) => {
                            tracing::warn!(tool = %call.tool_id, error = %err, "tool execution failed");
                            ToolResult {
                                tool_call_id: call.id.clone(),
                                tool_id: call.tool_id.clone(),
                                ok: false,
                                payload_json: serde_json::json!({"error": err.to_string()}),
                            }
                        }
                    };

                    messages.push(ModelMessage::Tool {
                        tool_call_id: result.tool_call_id.clone(),
                        content: serde_json::to_string(&result.payload_json).unwrap_or_default(),
                    });
                    per_tool_results.push(result);
                }

                if step + 1 == max_tool_calls {
                    tracing::info!(max_tool_calls, "agent loop reached its step cap");
                    return Ok(AgentOutcome { final_text: String::new(), per_tool_results });
                }
            }
        }
    }

    Ok(AgentOutcome { final_text: String::new(), per_tool_results })
}
