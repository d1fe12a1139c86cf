// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Model-facing wire contract (C4/C8): the agent driver speaks only this
//! trait, never `async-openai` directly, so it can be tested against a mock.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolArgs,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObjectArgs,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// A tool definition converted from a tool's JSON-schema contract
/// (`to_model_tool_def`, per the §9 redesign guidance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One message in the running transcript the driver builds up across steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ModelMessage {
    System { content: String },
    User { content: UserContent },
    Assistant { content: Option<String>, tool_calls: Vec<ToolCall> },
    Tool { tool_call_id: String, content: String },
}

/// The body of a user message: plain text, or text plus one binary part
/// (`spec.md` §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    WithBinaryPart { text: String, media_type: String, base64_data: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub tool_id: String,
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_id: String,
    pub ok: bool,
    pub payload_json: Value,
}

/// One model round-trip's outcome: either a final answer or a batch of tool
/// calls to execute before the next round-trip.
#[derive(Debug, Clone)]
pub enum ModelStep {
    ToolCalls(Vec<ToolCall>),
    FinalText(String),
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn step(
        &self,
        model_id: &str,
        messages: &[ModelMessage],
        tools: &[ToolDef],
    ) -> Result<ModelStep>;
}

/// `ModelClient` backed by an OpenAI-compatible chat-completions endpoint,
/// grounded on the wire types `llm-api-proxy` already depends on.
pub struct OpenAiModelClient {
    client: async_openai::Client<OpenAIConfig>,
}

impl OpenAiModelClient {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base_url) = base_url {
            config = config.with_api_base(base_url);
        }
        Self {
            client: async_openai::Client::with_config(config),
        }
    }

    fn convert_tool(def: &ToolDef) -> Result<ChatCompletionTool> {
        let function = FunctionObjectArgs::default()
            .name(def.name.clone())
            .description(def.description.clone())
            .parameters(def.parameters.clone())
            .build()
            .map_err(|e| ModelError::Provider { message: e.to_string() })?;

        ChatCompletionToolArgs::default()
            .r#type(ChatCompletionToolType::Function)
            .function(function)
            .build()
            .map_err(|e| ModelError::Provider { message: e.to_string() })
    }

    fn convert_message(message: &ModelMessage) -> Result<ChatCompletionRequestMessage> {
        let built = match message {
            ModelMessage::System { content } => ChatCompletionRequestSystemMessageArgs::default()
                .content(content.clone())
                .build()
                .map(Into::into),
            ModelMessage::User { content } => {
                let text = match content {
                    UserContent::Text(t) => t.clone(),
                    UserContent::WithBinaryPart { text, media_type, .. } => {
                        format!("{text}\n[attached: {media_type} part omitted from transcript log]")
                    }
                };
                ChatCompletionRequestUserMessageArgs::default().content(text).build().map(Into::into)
            }
            ModelMessage::Assistant { content, .. } => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content.clone().unwrap_or_default())
                .build()
                .map(Into::into),
            ModelMessage::Tool { tool_call_id, content } => ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(tool_call_id.clone())
                .content(content.clone())
                .build()
                .map(Into::into),
        };
        built.map_err(|e| ModelError::Provider { message: e.to_string() })
    }
}

#[async_trait]
impl ModelClient for OpenAiModelClient {
    async fn step(&self, model_id: &str, messages: &[ModelMessage], tools: &[ToolDef]) -> Result<ModelStep> {
        let wire_messages: Result<Vec<_>> = messages.iter().map(Self::convert_message).collect();
        let wire_tools: Result<Vec<_>> = tools.iter().map(Self::convert_tool).collect();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(model_id).messages(wire_messages?);
        let wire_tools = wire_tools?;
        if !wire_tools.is_empty() {
            builder.tools(wire_tools);
        }
        let request = builder.build().map_err(|e| ModelError::Provider { message: e.to_string() })?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ModelError::Provider { message: e.to_string() })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Provider { message: "model returned no choices".into() })?;

        if let Some(wire_calls) = choice.message.tool_calls {
            let calls = wire_calls
                .into_iter()
                .map(|call| {
                    let args: Value = serde_json::from_str(&call.function.arguments)
                        .unwrap_or_else(|_| Value::Object(Default::default()));
                    ToolCall {
                        id: call.id,
                        tool_id: call.function.name,
                        args,
                    }
                })
                .collect();
            return Ok(ModelStep::ToolCalls(calls));
        }

        Ok(ModelStep::FinalText(choice.message.content.unwrap_or_default()))
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Deterministic `ModelClient` double for agent-driver tests: returns a
    /// scripted sequence of steps, one per call.
    pub struct MockModelClient {
        steps: Mutex<Vec<ModelStep>>,
    }

    impl MockModelClient {
        pub fn new(steps: Vec<ModelStep>) -> Self {
            Self {
                steps: Mutex::new(steps.into_iter().rev().collect()),
            }
        }
    }

    #[async_trait]
    impl ModelClient for MockModelClient {
        async fn step(&self, _model_id: &str, _messages: &[ModelMessage], _tools: &[ToolDef]) -> Result<ModelStep> {
            self.steps
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ModelError::Provider { message: "mock exhausted".into() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockModelClient;
    use super::*;

    #[tokio::test]
    async fn mock_client_replays_scripted_steps_in_order() {
        let client = MockModelClient::new(vec![
            ModelStep::ToolCalls(vec![ToolCall {
                id: "1".into(),
                tool_id: "read_file".into(),
                args: serde_json::json!({"path": "a.txt"}),
            }]),
            ModelStep::FinalText("done".into()),
        ]);

        let first = client.step("openai/gpt-4o-mini", &[], &[]).await.unwrap();
        assert!(matches!(first, ModelStep::ToolCalls(_)));

        let second = client.step("openai/gpt-4o-mini", &[], &[]).await.unwrap();
        assert!(matches!(second, ModelStep::FinalText(t) if t == "done"));
    }
}
