//! Configuration settings for gitrag.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::PromptSettings;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub index: IndexSettings,
    pub rag: RagSettings,
    pub secrets: SecretSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
    /// HTTP timeout for every provider request (embeddings and generation), in seconds.
    pub timeout_secs: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use. Build and query must agree on it.
    pub model: String,
    /// Requested embedding dimensions (None = model default).
    pub dimensions: Option<u32>,
    /// Maximum documents per embedding request.
    pub batch_size: usize,
    /// Retry attempts for transient transport failures.
    pub max_retries: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            batch_size: 1000,
            max_retries: 3,
        }
    }
}

/// Diff chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub max_chunk_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chunk_chars: 4000,
        }
    }
}

/// Index artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Path of the index artifact.
    pub path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: "git.index".to_string(),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Sampling temperature for the generation call.
    pub temperature: f32,
    /// Upper bound on the assembled context, in characters.
    pub max_context_chars: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            top_k: 4,
            temperature: 0.2,
            max_context_chars: 24_000,
        }
    }
}

/// Where the provider API key is looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretSettings {
    /// Service identifier for the key lookup.
    pub service: String,
    /// Account identifier for the key lookup.
    pub account: String,
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            service: "openai".to_string(),
            account: "api_token".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else if path.is_some() {
            Err(crate::error::GitRagError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::GitRagError;

        if self.embedding.batch_size == 0 {
            return Err(GitRagError::Config(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.chunking.max_chunk_chars == 0 {
            return Err(GitRagError::Config(
                "chunking.max_chunk_chars must be at least 1".to_string(),
            ));
        }
        if self.general.timeout_secs == 0 {
            return Err(GitRagError::Config(
                "general.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() || self.rag.model.trim().is_empty() {
            return Err(GitRagError::Config("model names must not be empty".to_string()));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gitrag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded index artifact path.
    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.index.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.batch_size, 1000);
        assert_eq!(settings.chunking.max_chunk_chars, 4000);
        assert_eq!(settings.rag.top_k, 4);
        assert!((settings.rag.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.index.path, "git.index");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [rag]
            top_k = 8

            [index]
            path = "/tmp/history.index"
            "#,
        )
        .unwrap();

        assert_eq!(settings.rag.top_k, 8);
        assert_eq!(settings.rag.model, "gpt-4o-mini");
        assert_eq!(settings.index_path(), PathBuf::from("/tmp/history.index"));
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_timeout_is_a_general_setting() {
        let settings: Settings = toml::from_str("[general]\ntimeout_secs = 30\n").unwrap();
        assert_eq!(settings.general.timeout_secs, 30);
        assert_eq!(settings.general.log_level, "warn");
        assert_eq!(Settings::default().general.timeout_secs, 300);

        let mut settings = Settings::default();
        settings.general.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut settings = Settings::default();
        settings.embedding.batch_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(Settings::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nmax_chunk_chars = 120\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.chunking.max_chunk_chars, 120);
    }
}
