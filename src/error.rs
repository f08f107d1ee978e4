//! Error types for gitrag.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for gitrag operations.
#[derive(Error, Debug)]
pub enum GitRagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed record #{record}: {message}")]
    MalformedRecord { record: usize, message: String },

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation service error: {0}")]
    GenerationService(String),

    #[error("Index not found at {}. Run --build first.", .0.display())]
    IndexNotFound(PathBuf),

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("No API key found for service '{service}' (account '{account}')")]
    MissingSecret { service: String, account: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for gitrag operations.
pub type Result<T> = std::result::Result<T, GitRagError>;
