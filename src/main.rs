//! gitrag CLI entry point.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use gitrag::cli::preflight::{self, Operation};
use gitrag::cli::{commands, Cli, Output};
use gitrag::config::Settings;
use gitrag::openai::create_client_with_timeout;
use gitrag::secrets::default_secret_source;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.is_idle() {
        let _ = Cli::command().print_help();
        println!();
        return;
    }

    let outcome = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            Output::warning("Interrupted; nothing was written.");
            std::process::exit(130);
        }
    };

    if let Err(e) = outcome {
        Output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let settings = Settings::load_from(cli.config.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("gitrag={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let index = cli.index.clone().unwrap_or_else(|| settings.index_path());
    let top_k = cli.topk.unwrap_or(settings.rag.top_k);

    // Resolve the API key once, after checking inputs
    let operation = match &cli.build {
        Some(stream) => Operation::Build { stream },
        None => Operation::Ask { index: &index },
    };
    let api_key = preflight::check(operation, &settings, &default_secret_source())?;
    let client = create_client_with_timeout(
        &api_key,
        Duration::from_secs(settings.general.timeout_secs),
    )?;

    if let Some(stream) = &cli.build {
        commands::run_build(stream, &index, &settings, client.clone()).await?;
    }

    if let Some(question) = &cli.question {
        commands::run_ask(question, top_k, &index, &settings, client).await?;
    }

    Ok(())
}
