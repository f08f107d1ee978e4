//! RAG (Retrieval-Augmented Generation) over indexed commit history.
//!
//! Questions are embedded, matched against the index and the closest diff
//! chunks are handed to a generation model as context.

mod composer;
mod generator;
mod retriever;

pub use composer::{render_chunk, AnswerComposer, DEFAULT_MAX_CONTEXT_CHARS};
pub use generator::{Generator, OpenAIGenerator, DEFAULT_CHAT_MODEL, DEFAULT_TEMPERATURE};
pub use retriever::{Retriever, DEFAULT_TOP_K};

use crate::chunking::Chunk;
use crate::error::Result;
use crate::index::IndexStore;
use tracing::{info, instrument};

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the question (higher is better).
    pub score: f32,
}

/// Answer with the chunks it was based on.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer, best first.
    pub sources: Vec<ScoredChunk>,
}

/// Retrieval plus answer composition.
pub struct RagEngine {
    retriever: Retriever,
    composer: AnswerComposer,
    top_k: usize,
}

impl RagEngine {
    pub fn new(retriever: Retriever, composer: AnswerComposer) -> Self {
        Self {
            retriever,
            composer,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer a question from the index in `store`.
    ///
    /// The store is only read. An empty retrieval skips the generation call.
    #[instrument(skip(self, store), fields(question = %question))]
    pub async fn ask(&self, question: &str, store: &IndexStore) -> Result<RagResponse> {
        let artifact = store.load()?;
        info!(
            "Loaded index with {} chunks from {} commits",
            artifact.len(),
            artifact.commit_count()
        );

        let sources = self.retriever.retrieve(&artifact, question, self.top_k).await?;
        if sources.is_empty() {
            return Ok(RagResponse {
                answer: "I couldn't find any relevant changes in the indexed history for this question."
                    .to_string(),
                sources,
            });
        }

        let answer = self.composer.answer(&sources, question).await?;
        Ok(RagResponse { answer, sources })
    }
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n{} {} ({}) (score: {:.2})",
                    source.chunk.id,
                    source.chunk.metadata.subject,
                    source.chunk.metadata.date,
                    source.score
                ));
            }
        }

        output
    }
}
