//! Fetch a tile through a multi-dataset cluster.

use std::path::PathBuf;

use clap::Args;
use tilebeard::{ClusterBeard, ClusterConfig, RequestValidators};
use tracing::info;

use crate::error::CliError;

/// Arguments for the `cluster` command.
#[derive(Debug, Args)]
pub struct ClusterArgs {
    /// Cluster configuration file (JSON)
    #[arg(long)]
    pub config: PathBuf,

    /// Tile path, e.g. `osm/12/654/1583.png`
    pub tile: String,

    /// Write the tile body to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run the cluster command.
pub fn run(args: ClusterArgs) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(&args.config)?;
    let config: ClusterConfig =
        serde_json::from_str(&raw).map_err(|e| CliError::ConfigFile(e.to_string()))?;
    let cluster = ClusterBeard::new(config)?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;
    let response = runtime.block_on(async {
        cluster
            .serve_path(&args.tile, &RequestValidators::default(), None)
            .await
    });

    info!(tile = %args.tile, status = response.status, "Fetched cluster tile");
    println!("Status: {}", response.status);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }

    if response.status != 200 {
        return Err(CliError::Request {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        });
    }

    match args.output {
        Some(output) => {
            std::fs::write(&output, &response.body)?;
            println!("Wrote {} bytes to {}", response.body.len(), output.display());
        }
        None => println!("Body: {} bytes", response.body.len()),
    }
    Ok(())
}
