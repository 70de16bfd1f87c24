use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RAG_TOP_K: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which chunk store backs RAG ingestion and retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    /// Tantivy index on disk when a directory is given, in RAM otherwise.
    Tantivy { index_dir: Option<PathBuf> },
}

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub region: String,
    pub model_id: String,
    pub store: StoreKind,
    pub request_timeout: Duration,
    pub rag_top_k: usize,
    /// Set when running inside the Lambda runtime.
    pub lambda: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_var(
            "COLLOQUY_BIND_ADDR",
            get("COLLOQUY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let store = match get("COLLOQUY_STORE").as_deref().map(str::to_ascii_lowercase) {
            None => StoreKind::Memory,
            Some(kind) if kind == "memory" => StoreKind::Memory,
            Some(kind) if kind == "tantivy" => StoreKind::Tantivy {
                index_dir: get("COLLOQUY_INDEX_DIR").map(PathBuf::from),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "COLLOQUY_STORE",
                    value: other,
                    reason: "expected `memory` or `tantivy`".to_string(),
                });
            }
        };

        let timeout_secs: u64 = match get("COLLOQUY_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_var("COLLOQUY_REQUEST_TIMEOUT_SECS", raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "COLLOQUY_REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let rag_top_k: usize = match get("COLLOQUY_RAG_TOP_K") {
            Some(raw) => parse_var("COLLOQUY_RAG_TOP_K", raw)?,
            None => DEFAULT_RAG_TOP_K,
        };

        Ok(Self {
            bind_addr,
            region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            model_id: get("COLLOQUY_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            store,
            request_timeout: Duration::from_secs(timeout_secs),
            rag_top_k,
            lambda: get("AWS_LAMBDA_RUNTIME_API").is_some(),
        })
    }
}

fn parse_var<T>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value: raw,
    })
}
