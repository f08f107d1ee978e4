//! Configuration module for gitrag.
//!
//! Handles loading application settings and the answer prompt template.

mod prompts;
mod settings;

pub use prompts::PromptSettings;
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IndexSettings, RagSettings,
    SecretSettings, Settings,
};
