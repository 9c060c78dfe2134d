//! ContextClaw CLI — the main entry point.
//!
//! Commands:
//! - `inspect` — Assemble the next prompt for a transcript file
//! - `digest`  — Show the digest a tool output would be reduced to
//! - `config`  — Print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "contextclaw",
    about = "ContextClaw — token-budgeted context assembly for conversational agents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.contextclaw/config.toml)
    #[arg(short, long, global = true, env = "CONTEXTCLAW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the next prompt for a transcript and report its cost
    Inspect {
        /// Transcript JSON file
        transcript: PathBuf,

        /// Override the token budget
        #[arg(short, long)]
        budget: Option<usize>,

        /// Override the starting window slice (in messages)
        #[arg(short, long)]
        keep_turns: Option<usize>,

        /// Print the assembled prompt as JSON
        #[arg(long)]
        json: bool,
    },

    /// Digest a tool output file
    Digest {
        /// Tool name for the digest header
        name: String,

        /// File holding the raw tool output
        file: PathBuf,

        /// Override the digest character cap
        #[arg(short, long)]
        max_chars: Option<usize>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect {
            transcript,
            budget,
            keep_turns,
            json,
        } => commands::inspect::run(&config, &transcript, budget, keep_turns, json)?,
        Commands::Digest {
            name,
            file,
            max_chars,
        } => commands::digest::run(&config, &name, &file, max_chars)?,
        Commands::Config => commands::config_cmd::show(&config)?,
    }

    Ok(())
}
