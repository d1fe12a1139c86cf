// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Resolve the AI-gateway credential: `AI_GATEWAY_API_KEY` first, then the
//! `./token` file under the state home (`spec.md` §6).

use std::path::PathBuf;

/// Look up the API key. Returns `None` if neither source has one set.
pub fn resolve_api_key() -> Option<String> {
    if let Ok(key) = std::env::var("AI_GATEWAY_API_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }
    read_token_file(sf_state::home().join("token"))
}

fn read_token_file(path: PathBuf) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_takes_precedence_over_token_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token"), "file-key").unwrap();
        unsafe {
            std::env::set_var("SMARTFOLDER_HOME", dir.path());
            std::env::set_var("AI_GATEWAY_API_KEY", "env-key");
        }
        assert_eq!(resolve_api_key(), Some("env-key".to_string()));
        unsafe {
            std::env::remove_var("AI_GATEWAY_API_KEY");
        }
    }

    #[test]
    fn falls_back_to_token_file_when_env_var_unset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token"), "  file-key-2\n").unwrap();
        unsafe {
            std::env::remove_var("AI_GATEWAY_API_KEY");
            std::env::set_var("SMARTFOLDER_HOME", dir.path());
        }
        assert_eq!(resolve_api_key(), Some("file-key-2".to_string()));
    }

    #[test]
    fn returns_none_when_neither_source_is_set() {
        let dir = tempfile::tempdir().unwrap();
        unsafe {
            std::env::remove_var("AI_GATEWAY_API_KEY");
            std::env::set_var("SMARTFOLDER_HOME", dir.path());
        }
        assert_eq!(resolve_api_key(), None);
    }
}
