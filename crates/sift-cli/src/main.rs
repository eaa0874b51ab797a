//! Sift CLI - Extract structured records from long documents with a language model.

use clap::Parser;
use sift_cli::commands;
use sift_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> sift_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load or create config
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => match Config::path() {
            Ok(path) => Config::load_or_init(&path)?,
            Err(e) => {
                tracing::warn!("Using default configuration: {}", e);
                Config::default()
            }
        },
    };

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter).await?,
        Command::Chunk(args) => commands::execute_chunk(args, &config, &formatter)?,
        Command::Schema(args) => commands::execute_schema(args)?,
    }

    Ok(())
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose > 0 { "debug" } else { "info" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
