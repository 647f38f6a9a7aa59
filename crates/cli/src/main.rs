//! Quartermaster CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive procurement conversation
//! - `ask`: One turn, then exit
//! - `learn`: Teach a site rule or fact
//! - `memory`: List or search remembered facts
//! - `vendors`: Look up vendor prices in the catalog
//! - `doctor`: Diagnose configuration, memory store and catalog
//! - `config`: Print the default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "quartermaster",
    about = "Quartermaster: procurement assistant with semantic memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging and print the reasoning trace
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.quartermaster/config.toml)
    #[arg(short, long, global = true, env = "QUARTERMASTER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the procurement assistant
    Chat,

    /// Send a single message and print the reply
    Ask {
        #[arg(short, long)]
        message: String,

        /// Print the full turn reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a rule or fact in memory
    Learn {
        /// e.g. "Mumbai site budget limit is 50000"
        text: String,
    },

    /// Inspect the memory collection
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },

    /// Search the vendor catalog
    Vendors {
        /// Product name, matched case-insensitively
        product: String,
    },

    /// Diagnose system health
    Doctor,

    /// Print the default configuration as TOML
    Config,
}

#[derive(Subcommand)]
enum MemoryCommands {
    /// List every remembered fact
    List,

    /// Facts closest to a query
    Search {
        query: String,

        #[arg(short, long, default_value_t = 3)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Chat => commands::chat::run(config_path, cli.verbose).await?,
        Commands::Ask { message, json } => {
            commands::chat::ask(config_path, &message, json, cli.verbose).await?
        }
        Commands::Learn { text } => commands::memory::learn(config_path, &text).await?,
        Commands::Memory { command } => match command {
            MemoryCommands::List => commands::memory::list(config_path).await?,
            MemoryCommands::Search { query, limit } => {
                commands::memory::search(config_path, &query, limit).await?
            }
        },
        Commands::Vendors { product } => commands::vendors::run(config_path, &product).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Config => commands::config_cmd::run(config_path),
    }

    Ok(())
}
