//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::index::IndexStore;
use crate::rag::{AnswerComposer, OpenAIGenerator, RagEngine, Retriever};
use anyhow::Result;
use async_openai::config::OpenAIConfig;
use async_openai::Client;
use std::path::Path;
use std::sync::Arc;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    top_k: usize,
    index: &Path,
    settings: &Settings,
    client: Client<OpenAIConfig>,
) -> Result<()> {
    let embedder = Arc::new(OpenAIEmbedder::with_config(
        client.clone(),
        &settings.embedding.model,
        settings.embedding.dimensions,
        settings.embedding.max_retries,
    ));
    let generator = Arc::new(OpenAIGenerator::with_config(
        client,
        &settings.rag.model,
        settings.rag.temperature,
    ));

    let composer = AnswerComposer::new(generator)
        .with_prompts(settings.prompts.clone())
        .with_max_context_chars(settings.rag.max_context_chars);
    let engine = RagEngine::new(Retriever::new(embedder), composer).with_top_k(top_k);

    let spinner = Output::spinner("Searching history...");
    let result = engine.ask(question, &IndexStore::new(index)).await;
    spinner.finish_and_clear();
    let response = result?;

    println!("\n{}\n", response.answer);

    if !response.sources.is_empty() {
        Output::header("Sources");
        for source in &response.sources {
            Output::source(
                &source.chunk.id,
                &source.chunk.metadata.subject,
                &source.chunk.metadata.date,
                source.score,
                &source.chunk.text,
            );
        }
    }

    Ok(())
}
