// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized logging initialization for smartfolder-agent.
//!
//! Every binary and test harness in this workspace goes through here so log
//! format and level selection stay consistent. Behavior follows the env vars
//! contracted in the spec: `SMARTFOLDER_LOG_LEVEL` and `SMARTFOLDER_LOG_JSON`.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plaintext" | "text" => Ok(LogFormat::Plaintext),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format: {other} (use 'plaintext' or 'json')")),
        }
    }
}

/// `SMARTFOLDER_LOG_LEVEL` values, falling back to `info`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fatal" => Ok(Self::Fatal),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        // tracing has no FATAL level; fatal conditions are logged at ERROR
        // and the process exits separately.
        match level {
            LogLevel::Fatal | LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Read `SMARTFOLDER_LOG_LEVEL` and `SMARTFOLDER_LOG_JSON` and initialize the
/// global tracing subscriber. `verbose` (from `--verbose`) bumps the default
/// level to debug when no explicit env var is set.
pub fn init_from_env(component: &str, verbose: bool) -> anyhow::Result<()> {
    let level = std::env::var("SMARTFOLDER_LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<LogLevel>().ok())
        .unwrap_or(if verbose { LogLevel::Debug } else { LogLevel::Info });

    let json = std::env::var("SMARTFOLDER_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let format = if json { LogFormat::Json } else { LogFormat::Plaintext };

    init(component, level.into(), format)
}

/// Initialize tracing with an explicit level and format, writing to stdout.
pub fn init(component: &str, default_level: tracing::Level, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},{component}={default_level}")));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer().json();
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer();
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Redact a secret-bearing value before it reaches a log line.
pub fn redact(_value: impl std::fmt::Display) -> &'static str {
    "[REDACTED]"
}

/// Standardized CLI logging flags, flattened into each binary's `clap` args.
#[cfg(feature = "cli")]
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct CliLoggingArgs {
    /// Enable debug-level logging (shorthand; `SMARTFOLDER_LOG_LEVEL` still wins if set)
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliLoggingArgs {
    pub fn init(&self, component: &str) -> anyhow::Result<()> {
        init_from_env(component, self.verbose)
    }
}

/// Extension trait for attaching component/operation fields to a tracing span.
pub trait TracingExt {
    fn component(self, component: &str) -> Self;
}

impl TracingExt for tracing::Span {
    fn component(self, component: &str) -> Self {
        self.record("component", component);
        self
    }
}
