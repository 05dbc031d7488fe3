//! Flipbook CLI: inspect, preview, play, and export frame sequences.
//!
//! Usage:
//!   flipbook info <SEQUENCE>               Show sequence information
//!   flipbook overlay <SEQUENCE> --frame N  Show the overlay plan for a frame
//!   flipbook play <SEQUENCE>               Run timed playback and log advances
//!   flipbook export <SEQUENCE>             Export the sequence as a GIF

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use flipbook_common::config::AppConfig;

mod commands;
mod sequence;

#[derive(Parser)]
#[command(
    name = "flipbook",
    about = "Frame-by-frame animation sequences: preview, playback and export",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show sequence information
    Info {
        /// Path to the sequence file
        path: PathBuf,
    },

    /// Print the reference overlays shown while editing a frame
    Overlay {
        /// Path to the sequence file
        path: PathBuf,

        /// Zero-based frame to make active
        #[arg(short, long)]
        frame: usize,
    },

    /// Play the sequence and log every frame advance
    Play {
        /// Path to the sequence file
        path: PathBuf,

        /// Playback rate (overrides the sequence file)
        #[arg(long)]
        fps: Option<u32>,

        /// How long to play (seconds)
        #[arg(long, default_value = "2.0")]
        secs: f64,
    },

    /// Export the sequence as an animated GIF
    Export {
        /// Path to the sequence file
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Playback rate (overrides the sequence file)
        #[arg(long)]
        fps: Option<u32>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            AppConfig::from_json(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))
        }
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    flipbook_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Info { path } => commands::info::run(path, &config),
        Commands::Overlay { path, frame } => commands::overlay::run(path, frame, &config),
        Commands::Play { path, fps, secs } => commands::play::run(path, fps, secs, &config).await,
        Commands::Export { path, output, fps } => {
            commands::export::run(path, output, fps, &config).await
        }
    }
}
