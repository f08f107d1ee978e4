//! Text generation.

use crate::error::{GitRagError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Default model for answer generation.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature. Low, since answers should stick to the diffs.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Trait for single-prompt text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply to a single user prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI chat-completions generator.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGenerator {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self::with_config(client, DEFAULT_CHAT_MODEL, DEFAULT_TEMPERATURE)
    }

    pub fn with_config(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| GitRagError::GenerationService(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| GitRagError::GenerationService(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            GitRagError::GenerationService(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| GitRagError::GenerationService("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}
