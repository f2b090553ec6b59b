//! # Logging
//!
//! `tracing-subscriber` setup for simulation runs. The core emits `debug!`
//! events on loop state changes, gain writes and lock transitions, and
//! `trace!` events for ignored writes; the simulator adds `info!` per
//! scenario and `warn!` per failed expectation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use adpll_sim::logging::{init_logging, LogConfig, LogFormat, LogLevel};
//!
//! init_logging(&LogConfig {
//!     level: LogLevel::Debug,
//!     format: LogFormat::Compact,
//!     ..Default::default()
//! });
//!
//! tracing::info!(cycles = 800, "Scenario complete");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every tick-level event
    Trace,
    /// State changes and register writes
    Debug,
    /// Scenario progress
    Info,
    /// Failed expectations
    Warn,
    /// Errors only
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Machine-readable, one JSON object per event
    Json,
    /// Multi-line, human-readable
    Pretty,
    /// One line per event
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Compact
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include file:line of each event
    pub source_location: bool,
    /// Include wall-clock timestamps
    pub timestamps: bool,
    /// Directive string overriding `level`, e.g. "adpll_core=debug,adpll_sim=info"
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            source_location: false,
            timestamps: true,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Core state changes visible, simulator at info.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Info,
            filter: Some("adpll_core=debug,adpll_sim=debug".to_string()),
            source_location: true,
            ..Default::default()
        }
    }

    /// JSON lines without timestamps, for diffable CI logs.
    pub fn ci() -> Self {
        Self {
            format: LogFormat::Json,
            timestamps: false,
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            timestamps: false,
            ..Default::default()
        }
    }

    /// Filter from the explicit directive, else `RUST_LOG`, else `level`.
    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string());
        match self.filter {
            Some(ref directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed (for example by an
/// earlier test); the existing one is kept.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = config.env_filter();
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (config.format, config.timestamps) {
        (LogFormat::Json, true) => registry
            .with(fmt::layer().json().with_file(config.source_location).with_line_number(config.source_location))
            .try_init(),
        (LogFormat::Json, false) => registry
            .with(
                fmt::layer()
                    .json()
                    .without_time()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            )
            .try_init(),
        (LogFormat::Pretty, true) => registry
            .with(fmt::layer().pretty().with_file(config.source_location).with_line_number(config.source_location))
            .try_init(),
        (LogFormat::Pretty, false) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .without_time()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            )
            .try_init(),
        (LogFormat::Compact, true) => registry
            .with(fmt::layer().compact().with_file(config.source_location).with_line_number(config.source_location))
            .try_init(),
        (LogFormat::Compact, false) => registry
            .with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            )
            .try_init(),
    };

    result.is_ok()
}
