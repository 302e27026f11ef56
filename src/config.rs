//! Environment-driven configuration.
//!
//! All settings come from the process environment (a `.env` file is
//! honored via dotenvy). The OpenAI API key is the only required value;
//! everything else has a sensible default. Missing credentials fail
//! fast with a configuration error instead of surfacing later as an
//! opaque HTTP failure.

use std::env;
use std::path::PathBuf;

use crate::types::{AppError, Result};

/// Default chunk size in characters, shared by both pipelines.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default delay inserted before every embedding call, in milliseconds.
pub const DEFAULT_EMBED_DELAY_MS: u64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI API key. Required before any embedding or chat call.
    pub openai_api_key: String,
    /// Chat-completion model identifier.
    pub chat_model: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Fixed delay before each embedding call (rate limiting).
    pub embed_delay_ms: u64,
    /// Base directory for persisted vector store collections.
    pub store_dir: PathBuf,
    /// Directory scanned for CSV files by the QA pipeline.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            AppError::Config("OPENAI_API_KEY is not set (required for embeddings and chat)".into())
        })?;
        if openai_api_key.trim().is_empty() {
            return Err(AppError::Config("OPENAI_API_KEY is empty".into()));
        }

        let chunk_size: usize = parse_env("QUARRY_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(AppError::Config(
                "QUARRY_CHUNK_SIZE must be at least 1".into(),
            ));
        }

        Ok(Config {
            openai_api_key,
            chat_model: env::var("QUARRY_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            embedding_model: env::var("QUARRY_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            chunk_size,
            embed_delay_ms: parse_env("QUARRY_EMBED_DELAY_MS", DEFAULT_EMBED_DELAY_MS)?,
            store_dir: env::var("QUARRY_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("store")),
            data_dir: env::var("QUARRY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
