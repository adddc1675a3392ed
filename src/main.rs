//! # ragserve CLI
//!
//! The `ragserve` binary starts the document question-answering service.
//!
//! ## Usage
//!
//! ```bash
//! ragserve --config ./config/ragserve.toml serve
//! ```
//!
//! All server, chunking, retrieval, rate-limit, cache, and provider settings
//! are read from the TOML configuration file. See
//! `config/ragserve.example.toml` for a full example.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ragserve::{config, server};

/// ragserve — a document ingestion and retrieval-augmented question
/// answering service.
#[derive(Parser)]
#[command(
    name = "ragserve",
    about = "A document ingestion and retrieval-augmented question answering service",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragserve.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Serves `/upload`, `/query`, `/document/versions/{filename}`, and
    /// `/health` on the configured bind address.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
