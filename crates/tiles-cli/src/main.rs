//! Tiles CLI.
//!
//! A small host for tiles: `inspect` resolves a source through the loader
//! registry, `fetch` runs the whole Frame, Shuttle and Worker handshake
//! in-process and fetches paths through it.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tiles_telemetry::LogFormat;

mod commands;
mod config_bridge;

use commands::{fetch, inspect};

/// Tiles - sandboxed tile host
#[derive(Parser)]
#[command(name = "tiles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true, env = "TILES_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format: pretty, compact, json or full
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a tile source and print its title and icon
    Inspect {
        /// Tile source (directory path or file:// URL)
        source: String,
    },

    /// Load a tile in-process and fetch paths through its Worker
    Fetch {
        /// Tile source (directory path or file:// URL)
        source: String,

        /// Tile paths to fetch
        #[arg(required = true)]
        paths: Vec<String>,

        /// Write response bodies to stdout instead of a summary
        #[arg(long)]
        body: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = tiles_config::Config::load(cli.config.as_deref())
        .context("failed to load configuration")?;
    let config = resolved.config;

    let mut log_config = config_bridge::to_log_config(&config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Some(format) = &cli.log_format {
        log_config.format = format.parse::<LogFormat>()?;
    }
    if let Err(e) = tiles_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
    for file in &resolved.loaded_files {
        tracing::debug!(path = %file.display(), "Using config file");
    }

    match cli.command {
        Commands::Inspect { source } => {
            inspect::run_inspect(&source).await?;
        },
        Commands::Fetch {
            source,
            paths,
            body,
        } => {
            fetch::run_fetch(
                config_bridge::to_frame_config(&config)?,
                config_bridge::to_worker_config(&config),
                &source,
                &paths,
                body,
            )
            .await?;
        },
    }

    Ok(())
}
