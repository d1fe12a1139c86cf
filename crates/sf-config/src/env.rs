// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `$NAME` token resolution against a closed environment-variable whitelist.

use crate::error::{ConfigError, Result};
use serde_json::Value as J;

/// The only environment variable names a config file is permitted to
/// reference via a `$NAME` token. Anything else fails validation.
pub const ALLOWED_ENV_VARS: &[&str] = &["AI_GATEWAY_API_KEY"];

/// Build a `SMARTFOLDER_*`-prefixed JSON overlay from the process
/// environment, analogous to `config-core::env::env_overlay` but scoped to
/// this system's own prefix rather than a generic config crate.
pub fn smartfolder_env_overlay() -> J {
    let mut root = serde_json::json!({});
    for (key, value) in std::env::vars() {
        if let Some(rest) = key.strip_prefix("SMARTFOLDER_") {
            let field = rest.to_lowercase().replace('_', "-");
            if let Some(obj) = root.as_object_mut() {
                obj.insert(field, J::String(value));
            }
        }
    }
    root
}

/// Recursively resolve every `$NAME` token found inside string values,
/// substituting the current value of the named environment variable.
/// Fails validation if `NAME` is not in `ALLOWED_ENV_VARS`.
pub fn resolve_env_tokens(value: &mut J) -> Result<()> {
    match value {
        J::String(s) => {
            *s = substitute_tokens(s)?;
        }
        J::Array(items) => {
            for item in items {
                resolve_env_tokens(item)?;
            }
        }
        J::Object(map) => {
            for (_, v) in map.iter_mut() {
                resolve_env_tokens(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn substitute_tokens(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let mut name = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            out.push('$');
            continue;
        }

        if !ALLOWED_ENV_VARS.contains(&name.as_str()) {
            return Err(ConfigError::EnvVarNotAllowed(name));
        }

        let resolved = std::env::var(&name).unwrap_or_default();
        out.push_str(&resolved);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_allowed_token() {
        unsafe {
            std::env::set_var("AI_GATEWAY_API_KEY", "sk-test-123");
        }
        let resolved = substitute_tokens("Bearer $AI_GATEWAY_API_KEY").unwrap();
        assert_eq!(resolved, "Bearer sk-test-123");
    }

    #[test]
    fn rejects_non_whitelisted_token() {
        let err = substitute_tokens("$HOME/secrets").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotAllowed(name) if name == "HOME"));
    }

    #[test]
    fn leaves_plain_dollar_sign_alone() {
        let resolved = substitute_tokens("cost: $5").unwrap();
        assert_eq!(resolved, "cost: $5");
    }

    #[test]
    fn resolves_recursively_through_objects_and_arrays() {
        unsafe {
            std::env::set_var("AI_GATEWAY_API_KEY", "sk-abc");
        }
        let mut v = serde_json::json!({"ai": {"apiKey": "$AI_GATEWAY_API_KEY"}, "tags": ["$AI_GATEWAY_API_KEY"]});
        resolve_env_tokens(&mut v).unwrap();
        assert_eq!(v["ai"]["apiKey"], "sk-abc");
        assert_eq!(v["tags"][0], "sk-abc");
    }
}
