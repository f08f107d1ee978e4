//! CLI module for gitrag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::Parser;
use std::path::PathBuf;

/// gitrag - Build and query a RAG index over git history
///
/// Build an index from a `\0`-separated commit stream, then ask questions
/// about the history. Run with no arguments to see this help.
#[derive(Parser, Debug)]
#[command(name = "gitrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Parse and embed the commit stream at this path
    #[arg(long, value_name = "STREAM")]
    pub build: Option<PathBuf>,

    /// Ask a question about the indexed history
    #[arg(short, long)]
    pub question: Option<String>,

    /// How many chunks to retrieve as context
    #[arg(long)]
    pub topk: Option<usize>,

    /// Index artifact path (overrides index.path from the config)
    #[arg(long, env = "GITRAG_INDEX")]
    pub index: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// True when neither a build nor a question was requested.
    pub fn is_idle(&self) -> bool {
        self.build.is_none() && self.question.is_none()
    }
}
