//! gitrag - Retrieval-augmented question answering over git history
//!
//! # Overview
//!
//! gitrag ingests a stream of commits exported from git, splits every diff on
//! its hunk markers, embeds the pieces and stores them in a flat cosine
//! similarity index. Questions are answered by retrieving the closest diff
//! chunks and handing them to a generation model as context.
//!
//! # Architecture
//!
//! - `history` - Commit stream reader
//! - `chunking` - Hunk-based diff chunking
//! - `embedding` - Embedding provider and batching
//! - `index` - Flat vector index and its single-file store
//! - `rag` - Retrieval, prompt assembly and answer generation
//! - `pipeline` - Build pipeline coordination
//! - `config` / `secrets` - Settings and API key lookup
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use gitrag::config::Settings;
//! use gitrag::embedding::OpenAIEmbedder;
//! use gitrag::index::IndexStore;
//! use gitrag::openai::create_client;
//! use gitrag::pipeline::IndexBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let client = create_client("sk-...")?;
//!     let builder = IndexBuilder::new(Arc::new(OpenAIEmbedder::new(client)), &settings);
//!
//!     let report = builder
//!         .build(Path::new("repo.stream"), &IndexStore::new("git.index"), None)
//!         .await?;
//!     println!("Indexed {} chunks", report.chunks);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod history;
pub mod index;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod secrets;

#[cfg(test)]
mod testing;

pub use error::{GitRagError, Result};
