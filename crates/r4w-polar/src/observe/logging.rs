//! # Structured Logging
//!
//! Installs a `tracing-subscriber` fmt layer on stderr, so stdout stays free
//! for construction results.
//!
//! ## Example
//!
//! ```rust,no_run
//! use r4w_polar::observe::{init_logging, LogConfig, LogFormat, LogLevel};
//!
//! init_logging(&LogConfig {
//!     level: LogLevel::Debug,
//!     format: LogFormat::Json,
//!     ..Default::default()
//! });
//!
//! tracing::info!(n = 1024, "construction started");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One line per event
    #[default]
    Compact,
    /// Multi-line, human-readable
    Pretty,
    /// Machine-readable
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Directive string such as `"r4w_polar=debug"`. Overrides `level` and
    /// `RUST_LOG` when set.
    pub filter: Option<String>,
    /// Include `file:line` in each event
    pub source_location: bool,
    /// ANSI colours (ignored for JSON)
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            filter: None,
            source_location: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Debug level, pretty output with source locations.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            ansi: false,
            ..Default::default()
        }
    }

    /// Filter directive used when neither `filter` nor `RUST_LOG` applies.
    pub fn directive(&self) -> String {
        match &self.filter {
            Some(custom) if !custom.trim().is_empty() => custom.clone(),
            _ => self.level.to_string(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string());
        match &self.filter {
            Some(_) => EnvFilter::try_new(self.directive()).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed; the existing one
/// is kept.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = config.env_filter();
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let result = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json().with_ansi(false)),
        ),
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.pretty().with_ansi(config.ansi)),
        ),
        LogFormat::Compact => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.compact().with_ansi(config.ansi)),
        ),
    };
    result.is_ok()
}
