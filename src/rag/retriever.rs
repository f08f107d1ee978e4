//! Query-time retrieval against a built index.

use super::ScoredChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::{IndexArtifact, IndexStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Embeds questions and searches an index for the closest chunks.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Top-k chunks of an already loaded index, best first.
    #[instrument(skip(self, artifact, question), fields(k = k, indexed = artifact.len()))]
    pub async fn retrieve(
        &self,
        artifact: &IndexArtifact,
        question: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if artifact.model() != self.embedder.model() {
            warn!(
                "Index was built with '{}' but queries use '{}'; results may be poor",
                artifact.model(),
                self.embedder.model()
            );
        }
        if artifact.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(question).await?;
        let results: Vec<ScoredChunk> = artifact
            .search(&query, k)?
            .into_iter()
            .map(|(chunk, score)| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
            .collect();

        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }

    /// Load the index at `index_path` and retrieve from it.
    pub async fn ask(&self, question: &str, k: usize, index_path: &Path) -> Result<Vec<ScoredChunk>> {
        let artifact = IndexStore::new(index_path).load()?;
        self.retrieve(&artifact, question, k).await
    }
}
