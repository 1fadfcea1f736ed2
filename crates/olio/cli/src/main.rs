//! Olio CLI - drive session hydration from the terminal
//!
//! This CLI lets developers:
//! - Run the hydration coordinator against a JSON fixture world
//! - Replay sign-in, sign-out, refresh and reload steps
//! - Inspect or clear the persisted bootstrap cache

use clap::{Parser, Subcommand};
use olio_session::HydrationConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod fixture;
mod output;

use commands::{cache, hydrate};

/// Olio CLI application
#[derive(Parser)]
#[command(name = "olio")]
#[command(about = "Olio - session and organization hydration CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Hydration config file (TOML)
    #[arg(short, long, env = "OLIO_CONFIG")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Hydrate a fixture world and print the settled snapshot
    Hydrate(hydrate::HydrateArgs),

    /// Bootstrap cache management
    Cache {
        #[command(subcommand)]
        command: cache::CacheCommands,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = match cli.config.as_deref() {
        Some(path) => HydrationConfig::load(path)?,
        None => HydrationConfig::default(),
    };

    match cli.command {
        Commands::Hydrate(args) => hydrate::execute(args, config).await?,
        Commands::Cache { command } => cache::execute(command, &config)?,
        Commands::Config => output::print_json(&config)?,
    }
    Ok(())
}
