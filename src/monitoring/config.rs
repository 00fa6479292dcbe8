//! Logging configuration
//!
//! Loads from environment variables:
//! - RUST_LOG: Tracing filter (default: info)
//! - LOG_FORMAT: Console output format (json or text, default: text)
//! - LOG_DIR: Directory for daily-rotated JSON log files (unset = no file logging)
//! - LOG_CONSOLE: Enable console logging (default: true)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Filter directive used when RUST_LOG is not parseable by EnvFilter
    pub log_level: String,

    /// Console log format
    pub log_format: LogFormat,

    /// Directory for rotated log files
    pub log_dir: Option<PathBuf>,

    /// Enable console logging
    pub enable_console_logging: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn as_str(&self) -> &str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Text => "text",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            log_dir: None,
            enable_console_logging: true,
        }
    }
}

impl MonitoringConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(log_level) = lookup("RUST_LOG") {
            config.log_level = log_level;
        }

        if let Some(log_format) = lookup("LOG_FORMAT") {
            match log_format.parse() {
                Ok(format) => config.log_format = format,
                // Subscriber is not up yet, so this goes to stderr directly.
                Err(e) => eprintln!("{}; falling back to text", e),
            }
        }

        if let Some(log_dir) = lookup("LOG_DIR").filter(|d| !d.trim().is_empty()) {
            config.log_dir = Some(PathBuf::from(log_dir));
        }

        if let Some(console) = lookup("LOG_CONSOLE") {
            config.enable_console_logging = !matches!(console.to_lowercase().as_str(), "false" | "0");
        }

        config
    }

    /// Ensure log directory exists
    pub fn ensure_log_dir(&self) -> std::io::Result<()> {
        if let Some(dir) = &self.log_dir {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}
