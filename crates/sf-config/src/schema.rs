// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The raw, on-disk JSON config shape (§6) plus its JSON-Schema validator.
//!
//! Deliberately permissive/optional almost everywhere: defaults and the
//! `folders` xor `rootDirectories` rule are enforced in `loader::normalize`,
//! not by the schema itself, mirroring `config-core`'s split between schema
//! shape-validation and semantic validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAi {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    pub max_tool_calls: Option<u32>,
    pub default_tools: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFolderDefaults {
    pub tools: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub debounce_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub env: Option<HashMap<String, String>>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFolderEntry {
    pub path: String,
    pub prompt: Option<String>,
    pub tools: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub debounce_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub env: Option<HashMap<String, String>>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    pub ai: RawAi,
    pub folders: Option<Vec<RawFolderEntry>>,
    pub root_directories: Option<Vec<String>>,
    pub global_defaults: Option<RawFolderDefaults>,
    pub tools: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub debounce_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub discovery_interval_ms: Option<u64>,
    pub env: Option<HashMap<String, String>>,
    pub dry_run: Option<bool>,
}

/// Compile (once) and return the JSON Schema validator for `RawConfig`.
fn validator() -> &'static jsonschema::JSONSchema {
    use std::sync::OnceLock;

    static SCHEMA: OnceLock<serde_json::Value> = OnceLock::new();
    static VALIDATOR: OnceLock<jsonschema::JSONSchema> = OnceLock::new();

    let schema = SCHEMA.get_or_init(|| {
        let root = schemars::schema_for!(RawConfig);
        serde_json::to_value(root).expect("RawConfig schema must serialize")
    });

    VALIDATOR.get_or_init(|| {
        jsonschema::JSONSchema::options()
            .with_draft(jsonschema::Draft::Draft201909)
            .compile(schema)
            .expect("RawConfig schema must compile")
    })
}

pub fn validate_against_schema(value: &serde_json::Value) -> crate::error::Result<()> {
    let validator = validator();
    if let Err(errors) = validator.validate(value) {
        let msg = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("\n  - ");
        return Err(crate::error::ConfigError::SchemaInvalid(msg));
    }
    Ok(())
}
