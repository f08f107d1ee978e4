//! Build command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::index::IndexStore;
use crate::pipeline::IndexBuilder;
use anyhow::Result;
use async_openai::config::OpenAIConfig;
use async_openai::Client;
use std::path::Path;
use std::sync::Arc;

/// Run the build command.
pub async fn run_build(
    stream: &Path,
    index: &Path,
    settings: &Settings,
    client: Client<OpenAIConfig>,
) -> Result<()> {
    Output::info(&format!("Parsing git stream {}", stream.display()));

    let embedder = Arc::new(OpenAIEmbedder::with_config(
        client,
        &settings.embedding.model,
        settings.embedding.dimensions,
        settings.embedding.max_retries,
    ));
    let builder = IndexBuilder::new(embedder, settings);
    let store = IndexStore::new(index);

    let progress = Output::progress_bar(0, "chunks embedded");
    let result = builder.build(stream, &store, Some(progress.clone())).await;
    progress.finish_and_clear();

    let report = result?;
    Output::success(&format!(
        "Indexed {} chunks from {} commits ({} dimensions)",
        report.chunks, report.commits, report.dimensions
    ));
    Output::success(&format!("Index saved to {}", index.display()));

    Ok(())
}
