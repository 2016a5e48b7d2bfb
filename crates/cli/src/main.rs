//! NodeBuilder CLI — the main entry point.
//!
//! Commands:
//! - `plan`     — Print the mapping instructions for input data
//! - `resolve`  — Print which resolution path input data takes
//! - `check`    — Validate a configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "nodebuilder",
    about = "NodeBuilder — array-to-entity mapping inspector",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $NODEBUILDER_CONFIG or ./nodebuilder.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ordered mapping instructions for input data
    Plan {
        /// Entity type to map onto
        #[arg(short = 't', long = "type")]
        entity_type: String,

        /// Input data: inline JSON object, a JSON file path, or `-` for stdin
        #[arg(short, long)]
        data: String,
    },

    /// Print which resolution path input data would take
    Resolve {
        /// Entity type to resolve
        #[arg(short = 't', long = "type")]
        entity_type: String,

        /// Input data: inline JSON object, a JSON file path, or `-` for stdin
        #[arg(short, long)]
        data: String,
    },

    /// Validate the configuration and print a summary
    Check,
}

fn main() -> anyhow::Result<()> {
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

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Plan { entity_type, data } => commands::plan::run(config, &entity_type, &data)?,
        Commands::Resolve { entity_type, data } => {
            commands::resolve::run(config, &entity_type, &data)?
        }
        Commands::Check => commands::check::run(config)?,
    }

    Ok(())
}
