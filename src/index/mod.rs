//! Vector index and its on-disk artifact.
//!
//! An [`IndexArtifact`] pairs a [`FlatIndex`] with the chunks it was built
//! from. Position `i` in the index is always chunk `i`; the pair only grows by
//! appending both sides together.

mod flat;
mod store;

pub use flat::{normalize_l2, FlatIndex, SearchHit};
pub use store::{IndexStore, FORMAT_VERSION};

use crate::chunking::Chunk;
use crate::embedding::EmbeddingRecord;
use crate::error::{GitRagError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Normalized vectors plus their chunks, position-aligned.
#[derive(Debug, Clone)]
pub struct IndexArtifact {
    model: String,
    built_at: DateTime<Utc>,
    index: FlatIndex,
    chunks: Vec<Chunk>,
}

impl IndexArtifact {
    /// Create an empty artifact for vectors produced by `model`.
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            built_at: Utc::now(),
            index: FlatIndex::new(),
            chunks: Vec::new(),
        }
    }

    /// Assemble an artifact from chunks and their embeddings.
    ///
    /// Records must be in chunk order with matching ids.
    pub fn from_records(model: &str, chunks: Vec<Chunk>, records: Vec<EmbeddingRecord>) -> Result<Self> {
        if chunks.len() != records.len() {
            return Err(GitRagError::InvalidIndex(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                records.len()
            )));
        }

        let mut artifact = Self::new(model);
        for (chunk, record) in chunks.into_iter().zip(records) {
            if chunk.id != record.chunk_id {
                return Err(GitRagError::InvalidIndex(format!(
                    "embedding for '{}' found where '{}' was expected",
                    record.chunk_id, chunk.id
                )));
            }
            artifact.push(chunk, &record.vector)?;
        }
        Ok(artifact)
    }

    /// Append one chunk and its vector. Nothing is added on error.
    pub fn push(&mut self, chunk: Chunk, vector: &[f32]) -> Result<()> {
        self.index.add(vector)?;
        self.chunks.push(chunk);
        Ok(())
    }

    pub(crate) fn from_parts(
        model: String,
        built_at: DateTime<Utc>,
        index: FlatIndex,
        chunks: Vec<Chunk>,
    ) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(GitRagError::InvalidIndex(format!(
                "{} vectors but {} chunks",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self {
            model,
            built_at,
            index,
            chunks,
        })
    }

    /// Embedding model the vectors came from.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    /// Number of distinct commits with at least one chunk.
    pub fn commit_count(&self) -> usize {
        self.chunks
            .iter()
            .map(|c| c.commit.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Top-k chunks for a query vector, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(&Chunk, f32)>> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|hit| (&self.chunks[hit.position], hit.score))
            .collect())
    }
}
