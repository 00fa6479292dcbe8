// src/config.rs
//! Environment configuration for the gateway and the ingestion service.
//!
//! Both `from_env` constructors load `.env` first (via dotenvy) and then read
//! process variables. `from_lookup` takes any key lookup so tests can build a
//! config without touching the process environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::chunker::{ChunkError, Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_API_KEY: &str = "dev-key-change-in-production";
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";
pub const DEFAULT_INGESTION_URL: &str = "http://localhost:8001";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///./documents.db";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Unsupported DATABASE_URL: {0}")]
    UnsupportedDatabaseUrl(String),
    #[error("Invalid chunking configuration: {0}")]
    Chunking(#[from] ChunkError),
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            })
        }
        _ => Ok(default),
    }
}

fn string_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Where document metadata lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl FromStr for DatabaseLocation {
    type Err = ConfigError;

    /// Accepts `sqlite:///relative/or/./path.db`, `sqlite:////abs/path.db`,
    /// `sqlite://` (in-memory), `:memory:` and bare file paths.
    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let url = url.trim();
        if url == ":memory:" || url == "sqlite://" || url == "sqlite:///:memory:" {
            return Ok(DatabaseLocation::Memory);
        }
        if let Some(path) = url.strip_prefix("sqlite:///") {
            if path.is_empty() {
                return Err(ConfigError::UnsupportedDatabaseUrl(url.to_string()));
            }
            return Ok(DatabaseLocation::File(PathBuf::from(path)));
        }
        if url.contains("://") {
            return Err(ConfigError::UnsupportedDatabaseUrl(url.to_string()));
        }
        Ok(DatabaseLocation::File(PathBuf::from(url)))
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub api_key_header: String,
    pub ingestion_url: String,
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let allowed_extensions = lookup("ALLOWED_EXTENSIONS")
            .map(|raw| parse_extensions(&raw))
            .filter(|exts| !exts.is_empty())
            .unwrap_or_else(|| vec![".pdf".to_string()]);

        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_UPLOAD_BYTES".into(),
                value: "0".into(),
            });
        }

        let timeout_secs: u64 =
            parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "UPSTREAM_TIMEOUT_SECS".into(),
                value: "0".into(),
            });
        }

        Ok(Self {
            host: string_or(&lookup, "GATEWAY_HOST", "0.0.0.0"),
            port: parse_or(&lookup, "GATEWAY_PORT", 8000)?,
            api_key: string_or(&lookup, "API_KEY", DEFAULT_API_KEY),
            api_key_header: string_or(&lookup, "API_KEY_HEADER", DEFAULT_API_KEY_HEADER),
            ingestion_url: string_or(&lookup, "INGESTION_SERVICE_URL", DEFAULT_INGESTION_URL)
                .trim_end_matches('/')
                .to_string(),
            max_upload_bytes,
            allowed_extensions,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_default_api_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }
}

/// Normalise a comma separated list like `pdf, .PDF ,txt` into `[".pdf", ".txt"]`.
fn parse_extensions(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let t = token.trim().trim_start_matches('.').to_ascii_lowercase();
        if t.is_empty() {
            continue;
        }
        let ext = format!(".{}", t);
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub host: String,
    pub port: u16,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub database: DatabaseLocation,
}

impl IngestionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            host: string_or(&lookup, "INGESTION_HOST", "0.0.0.0"),
            port: parse_or(&lookup, "INGESTION_PORT", 8001)?,
            chunk_size: parse_or(&lookup, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_or(&lookup, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            database: string_or(&lookup, "DATABASE_URL", DEFAULT_DATABASE_URL).parse()?,
        };
        // Reject a bad size/overlap pair at start-up rather than per request.
        config.chunker()?;
        Ok(config)
    }

    pub fn chunker(&self) -> Result<Chunker, ChunkError> {
        Chunker::new(self.chunk_size, self.chunk_overlap)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
