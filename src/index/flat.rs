//! Exact (brute-force) inner-product index over unit-normalized vectors.

use crate::error::{GitRagError, Result};

/// A scored position in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Insertion position of the matched vector.
    pub position: usize,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Flat vector index.
///
/// Vectors are L2-normalized on insertion, so the inner product used by
/// [`FlatIndex::search`] is cosine similarity. Storage is one contiguous
/// row-major buffer; the first vector fixes the dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndex {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension, or 0 while the index is empty.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Stored (normalized) vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimensions;
        Some(&self.data[start..start + self.dimensions])
    }

    /// Normalize and append a vector.
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        let mut normalized = vector.to_vec();
        normalize_l2(&mut normalized);
        self.push_normalized(&normalized)
    }

    /// Append a vector that is already normalized (used when loading).
    pub(crate) fn push_normalized(&mut self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(GitRagError::InvalidIndex("empty vector".to_string()));
        }
        if self.dimensions == 0 {
            self.dimensions = vector.len();
        } else if vector.len() != self.dimensions {
            return Err(GitRagError::InvalidIndex(format!(
                "dimension mismatch: index has {}, vector has {}",
                self.dimensions,
                vector.len()
            )));
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Return the `k` positions most similar to `query`.
    ///
    /// Scores are non-increasing; ties go to the lower position. Asking for
    /// more results than stored returns everything.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(GitRagError::InvalidIndex(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut query = query.to_vec();
        normalize_l2(&mut query);

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, vector)| SearchHit {
                position,
                score: dot(&query, vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.position.cmp(&b.position))
        });
        hits.truncate(k);

        Ok(hits)
    }
}

/// Scale a vector to unit length in place. Zero vectors are left unchanged.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
