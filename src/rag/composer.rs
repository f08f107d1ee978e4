//! Prompt assembly and answer generation.

use super::{Generator, ScoredChunk};
use crate::chunking::{truncate_chars, Chunk};
use crate::config::PromptSettings;
use crate::error::{GitRagError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default upper bound on assembled context, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 24_000;

/// Render one chunk as `<subject> (<date>)\n<text>`.
pub fn render_chunk(chunk: &Chunk) -> String {
    format!(
        "{} ({})\n{}",
        chunk.metadata.subject, chunk.metadata.date, chunk.text
    )
}

/// Turns retrieved chunks and a question into a generated answer.
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    prompts: PromptSettings,
    max_context_chars: usize,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompts: PromptSettings::default(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }

    /// Use a custom prompt template and separator.
    pub fn with_prompts(mut self, prompts: PromptSettings) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars.max(1);
        self
    }

    /// Join rendered chunks in retrieval order until the budget is spent.
    ///
    /// The first chunk is always included, cut to the budget if needed.
    pub fn build_context(&self, chunks: &[ScoredChunk]) -> String {
        let separator = self.prompts.separator.as_str();
        let separator_chars = separator.chars().count();
        let mut context = String::new();
        let mut used = 0usize;

        for (i, scored) in chunks.iter().enumerate() {
            let rendered = render_chunk(&scored.chunk);
            let rendered_chars = rendered.chars().count();

            if i == 0 {
                let first = truncate_chars(&rendered, self.max_context_chars);
                used = first.chars().count();
                context.push_str(first);
                continue;
            }

            if used + separator_chars + rendered_chars > self.max_context_chars {
                debug!("Context budget reached after {} of {} chunks", i, chunks.len());
                break;
            }
            context.push_str(separator);
            context.push_str(&rendered);
            used += separator_chars + rendered_chars;
        }

        context
    }

    /// Build the full prompt: context followed by the literal question.
    pub fn build_prompt(&self, chunks: &[ScoredChunk], question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), self.build_context(chunks));
        vars.insert("question".to_string(), question.to_string());
        PromptSettings::render(&self.prompts.template, &vars)
    }

    /// Ask the generator and return its trimmed reply.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn answer(&self, chunks: &[ScoredChunk], question: &str) -> Result<String> {
        let prompt = self.build_prompt(chunks, question);
        let reply = self.generator.complete(&prompt).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GitRagError::GenerationService("Empty response from LLM".to_string()));
        }
        Ok(reply.to_string())
    }
}
