//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{GitRagError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{CreateEmbeddingRequestArgs, Embedding, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
    max_retries: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder with the default model.
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self::with_config(client, DEFAULT_EMBEDDING_MODEL, None, 3)
    }

    /// Create an embedder with a custom model, dimensions and retry budget.
    pub fn with_config(
        client: Client<OpenAIConfig>,
        model: &str,
        dimensions: Option<u32>,
        max_retries: usize,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
            max_retries,
        }
    }

    async fn request(&self, texts: &[String]) -> std::result::Result<Vec<Embedding>, OpenAIError> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model)
            .input(EmbeddingInput::StringArray(texts.to_vec()));
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args.build()?;

        let response = self.client.embeddings().create(request).await?;
        Ok(response.data)
    }
}

/// Put response items back in input order.
///
/// Items are sorted by their `index`; the result must cover exactly
/// `0..expected`, otherwise vectors cannot be matched to inputs.
fn align(mut data: Vec<Embedding>, expected: usize) -> Result<Vec<Vec<f32>>> {
    data.sort_by_key(|e| e.index);
    let in_order = data.len() == expected
        && data.iter().enumerate().all(|(i, e)| e.index as usize == i);
    if !in_order {
        let indices: Vec<u32> = data.iter().map(|e| e.index).collect();
        return Err(GitRagError::EmbeddingService(format!(
            "response items do not line up with inputs ({} inputs, indices {:?})",
            expected, indices
        )));
    }

    Ok(data.into_iter().map(|e| e.embedding).collect())
}

/// Transport failures worth another attempt.
fn is_transient(err: &OpenAIError) -> bool {
    match err {
        OpenAIError::Reqwest(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

/// Capped exponential backoff.
fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| GitRagError::EmbeddingService("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut attempt = 0usize;
        loop {
            match self.request(texts).await {
                Ok(data) => {
                    let embeddings = align(data, texts.len())?;
                    debug!("Generated {} embeddings", embeddings.len());
                    return Ok(embeddings);
                }
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = retry_backoff(attempt);
                    warn!(
                        "Embedding request failed ({}), retrying in {:?} (attempt {}/{})",
                        e, delay, attempt, self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(GitRagError::EmbeddingService(e.to_string()));
                }
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
