use anyhow::Result;
use clap::{Parser, Subcommand};

use billing::{commands, config};

#[derive(Parser)]
#[command(name = "billing")]
#[command(about = "Rating-weighted coin emission ledger", long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.billing/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config with the demo user set
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Seed the ledger and serve JSON-RPC requests
    Run {
        /// Override the configured RPC port
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Init { force } => commands::init::run(&config_path, force),
        Commands::Run { port } => commands::run::run(&config_path, port),
    }
}
