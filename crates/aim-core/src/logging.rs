//! Logging configuration and initialization
//!
//! Centralized tracing setup shared by the server and CLI binaries.
//! Diagnostics are the only failure report this pipeline produces, so
//! every component logs through `tracing`; no `println!` outside the
//! CLI's user-facing output.
//!
//! Configuration comes from the environment:
//! - `LOG_LEVEL`: trace | debug | info | warn | error
//! - `LOG_FORMAT`: text | json
//! - `LOG_FILTER`: extra filter directives (e.g. "aim_core=debug,hyper=warn")

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, SyncError};

/// Minimum level for emitted log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(SyncError::Config(format!("invalid log level: {}", s))),
        }
    }
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

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured log collection
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(SyncError::Config(format!("invalid log format: {}", s))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Minimum log level to emit
    pub level: LogLevel,

    /// Output format (text or JSON)
    pub format: LogFormat,

    /// Additional filter directives, appended after the base level
    pub filter: Option<String>,
}

impl LogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.level = level.parse()?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.format = format.parse()?;
        }

        if let Ok(filter) = std::env::var("LOG_FILTER") {
            config.filter = Some(filter);
        }

        Ok(config)
    }

    /// Override the level, keeping everything else (CLI `--verbose`)
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let mut directives = self.level.to_string();
        if let Some(extra) = &self.filter {
            directives.push(',');
            directives.push_str(extra);
        }
        EnvFilter::new(directives)
    }
}

/// Install the global tracing subscriber.
///
/// Call once, first thing in each binary. A second call fails because the
/// global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(true);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| SyncError::Config(format!("failed to install subscriber: {}", e)))
}
