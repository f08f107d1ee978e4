//! In-process fakes for the provider traits, shared by unit tests.

use crate::chunking::{Chunk, ChunkMetadata};
use crate::embedding::Embedder;
use crate::error::{GitRagError, Result};
use crate::rag::Generator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) fn sample_chunk(id: &str, commit: &str, text: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        commit: commit.to_string(),
        metadata: ChunkMetadata {
            author: "A".to_string(),
            date: "2024-01-01".to_string(),
            subject: format!("subject {}", id),
            hunk: None,
        },
        text: text.to_string(),
    }
}

/// Embedder that records the size of every request.
pub(crate) struct RecordingEmbedder {
    pub calls: Mutex<Vec<usize>>,
    pub fail_on_call: Option<usize>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on_call: None,
        }
    }

    /// Vector derived from the text so ordering is observable.
    pub fn vector_for(text: &str) -> Vec<f32> {
        vec![text.len() as f32, 1.0, 0.0]
    }
}

#[async_trait]
impl Embedder for RecordingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(texts.len());
        if self.fail_on_call == Some(calls.len()) {
            return Err(GitRagError::EmbeddingService("rate limited".to_string()));
        }
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn model(&self) -> &str {
        "recording"
    }
}

/// Embedder with a fixed text-to-vector table.
pub(crate) struct TableEmbedder {
    pub vectors: HashMap<String, Vec<f32>>,
    pub model: String,
}

impl TableEmbedder {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            model: "table".to_string(),
        }
    }

    fn lookup(&self, text: &str) -> Result<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| GitRagError::EmbeddingService(format!("no vector for '{}'", text)))
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.lookup(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.lookup(t)).collect()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Generator that remembers prompts and returns a canned reply.
pub(crate) struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub reply: std::result::Result<String, String>,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: Ok(reply.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .map_err(GitRagError::GenerationService)
    }
}
