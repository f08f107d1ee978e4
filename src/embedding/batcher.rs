//! Size-bounded batching of chunk embeddings.

use super::Embedder;
use crate::chunking::Chunk;
use crate::error::{GitRagError, Result};
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Maximum documents per embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// The embedding of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub chunk_id: String,
    pub vector: Vec<f32>,
}

/// Groups chunks into batches and embeds them one request at a time.
///
/// Requests are issued strictly in sequence. The first failing batch aborts
/// the whole run.
pub struct EmbeddingBatcher {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    progress: Option<ProgressBar>,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            progress: None,
        }
    }

    /// Set the batch size limit. Values below 1 are treated as 1.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Advance a progress bar by the number of chunks in each finished batch.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Embed every chunk, returning records in chunk order.
    #[instrument(skip_all, fields(chunks = chunks.len(), batch_size = self.batch_size))]
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<EmbeddingRecord>> {
        let mut records = Vec::with_capacity(chunks.len());
        let mut texts: Vec<String> = Vec::with_capacity(self.batch_size.min(chunks.len()));
        let mut ids: Vec<String> = Vec::with_capacity(texts.capacity());
        let mut batches = 0usize;

        for chunk in chunks {
            texts.push(chunk.text.clone());
            ids.push(chunk.id.clone());
            if texts.len() == self.batch_size {
                self.flush(&mut texts, &mut ids, &mut records).await?;
                batches += 1;
            }
        }
        if !texts.is_empty() {
            self.flush(&mut texts, &mut ids, &mut records).await?;
            batches += 1;
        }

        info!("Embedded {} chunks in {} requests", records.len(), batches);
        Ok(records)
    }

    async fn flush(
        &self,
        texts: &mut Vec<String>,
        ids: &mut Vec<String>,
        records: &mut Vec<EmbeddingRecord>,
    ) -> Result<()> {
        debug!("Embedding batch of {}", texts.len());
        let vectors = self.embedder.embed_batch(texts.as_slice()).await?;
        if vectors.len() != texts.len() {
            return Err(GitRagError::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        records.extend(
            ids.drain(..)
                .zip(vectors)
                .map(|(chunk_id, vector)| EmbeddingRecord { chunk_id, vector }),
        );

        if let Some(progress) = &self.progress {
            progress.inc(texts.len() as u64);
        }
        texts.clear();
        Ok(())
    }
}
