// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! One authoritative JSON schema per tool, plus the two pure functions the
//! §9 redesign guidance asks for: a model-tool-def projection and an
//! args validator. No reflection — each tool's arg struct derives
//! `schemars::JsonSchema` once and both functions read from that.

use jsonschema::JSONSchema;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;
use sf_config::ToolId;
use std::sync::OnceLock;

use crate::error::{Result, ToolError};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileArgs {
    pub path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileArgs {
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameFileArgs {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveFileArgs {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GrepArgs {
    pub path: String,
    pub pattern: String,
    #[serde(default)]
    pub case_insensitive: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SedArgs {
    pub path: String,
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub case_insensitive: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HeadArgs {
    pub path: String,
    #[serde(default)]
    pub lines: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TailArgs {
    pub path: String,
    #[serde(default)]
    pub lines: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateFolderArgs {
    pub path: String,
}

/// Human-facing description surfaced to the model alongside each tool's
/// schema (`spec.md` §4.7).
pub fn description(tool: ToolId) -> &'static str {
    match tool {
        ToolId::ReadFile => "Read a text file's contents (refuses binary extensions and files over 256 KiB).",
        ToolId::WriteFile => "Create a brand-new file with the given contents. Fails if the target already exists; use rename_file to rename.",
        ToolId::RenameFile => "Rename a file within the folder. The new name must keep the original extension.",
        ToolId::MoveFile => "Move a file or directory within the folder.",
        ToolId::Grep => "Search a text file for a literal substring, returning matching lines.",
        ToolId::Sed => "Replace every literal occurrence of one string with another in a text file.",
        ToolId::Head => "Read the first N lines of a text file.",
        ToolId::Tail => "Read the last N lines of a text file.",
        ToolId::CreateFolder => "Create a new directory, including any missing parent directories.",
    }
}

fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).expect("schemars schema always serializes")
}

/// Project a tool's schema into the `{name, description, parameters}` shape
/// a model-facing tool definition needs.
pub fn to_model_tool_def(tool: ToolId) -> (String, String, Value) {
    let schema = match tool {
        ToolId::ReadFile => schema_value::<ReadFileArgs>(),
        ToolId::WriteFile => schema_value::<WriteFileArgs>(),
        ToolId::RenameFile => schema_value::<RenameFileArgs>(),
        ToolId::MoveFile => schema_value::<MoveFileArgs>(),
        ToolId::Grep => schema_value::<GrepArgs>(),
        ToolId::Sed => schema_value::<SedArgs>(),
        ToolId::Head => schema_value::<HeadArgs>(),
        ToolId::Tail => schema_value::<TailArgs>(),
        ToolId::CreateFolder => schema_value::<CreateFolderArgs>(),
    };
    (tool.as_str().to_string(), description(tool).to_string(), schema)
}

macro_rules! validator_cell {
    ($name:ident, $ty:ty) => {
        fn $name() -> &'static JSONSchema {
            static CELL: OnceLock<JSONSchema> = OnceLock::new();
            CELL.get_or_init(|| {
                JSONSchema::compile(&schema_value::<$ty>()).expect("schema compiles")
            })
        }
    };
}

validator_cell!(read_file_validator, ReadFileArgs);
validator_cell!(write_file_validator, WriteFileArgs);
validator_cell!(rename_file_validator, RenameFileArgs);
validator_cell!(move_file_validator, MoveFileArgs);
validator_cell!(grep_validator, GrepArgs);
validator_cell!(sed_validator, SedArgs);
validator_cell!(head_validator, HeadArgs);
validator_cell!(tail_validator, TailArgs);
validator_cell!(create_folder_validator, CreateFolderArgs);

/// Validate raw model-supplied args against a tool's schema before the tool
/// ever touches the filesystem.
pub fn validate_args(tool: ToolId, value: &Value) -> Result<()> {
    let validator = match tool {
        ToolId::ReadFile => read_file_validator(),
        ToolId::WriteFile => write_file_validator(),
        ToolId::RenameFile => rename_file_validator(),
        ToolId::MoveFile => move_file_validator(),
        ToolId::Grep => grep_validator(),
        ToolId::Sed => sed_validator(),
        ToolId::Head => head_validator(),
        ToolId::Tail => tail_validator(),
        ToolId::CreateFolder => create_folder_validator(),
    };

    validator.validate(value).map_err(|errors| {
        let message = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
        ToolError::InvalidArgs { tool: tool.as_str(), message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_read_file_args_pass_validation() {
        let value = serde_json::json!({"path": "a.txt"});
        assert!(validate_args(ToolId::ReadFile, &value).is_ok());
    }

    #[test]
    fn missing_required_field_fails_validation() {
        let value = serde_json::json!({});
        assert!(validate_args(ToolId::ReadFile, &value).is_err());
    }

    #[test]
    fn model_tool_def_carries_the_tool_name() {
        let (name, _desc, schema) = to_model_tool_def(ToolId::Sed);
        assert_eq!(name, "sed");
        assert!(schema["properties"]["find"].is_object());
    }
}
