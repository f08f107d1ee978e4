//! Embedding generation for semantic search and retrieval.

mod batcher;
mod openai;

pub use batcher::{EmbeddingBatcher, EmbeddingRecord, DEFAULT_BATCH_SIZE};
pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
///
/// Implementations must return exactly one vector per input text, in the same
/// order as the inputs. Callers re-associate vectors with their documents by
/// position.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier of the embedding model. Indexes record it so queries can
    /// detect a mismatched embedding space.
    fn model(&self) -> &str;
}
