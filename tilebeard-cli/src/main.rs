//! tilebeard CLI.
//!
//! Fetches tiles through the adapter and manages the on-disk tile cache.

mod commands;
mod error;
mod filters;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::cache::CacheAction;
use commands::cluster::ClusterArgs;
use commands::fetch::FetchArgs;

#[derive(Parser)]
#[command(
    name = "tilebeard",
    version,
    about = "Slippy-map tile adapter: serve tiles from disk, remote origins, or on-demand generation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single tile through the adapter
    Fetch(FetchArgs),

    /// Fetch a tile through a multi-dataset cluster
    Cluster(ClusterArgs),

    /// Inspect or clear the disk tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args),
        Commands::Cluster(args) => commands::cluster::run(args),
        Commands::Cache { action } => commands::cache::run(action),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
