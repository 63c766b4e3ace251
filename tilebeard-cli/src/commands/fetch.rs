//! One-shot tile fetch through the adapter.
//!
//! Exercises the full serve path (cache read-through, remote fetch or
//! generation, validators, compression) from the command line, writing the
//! tile body to a file or printing the response metadata.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tilebeard::{
    BeardConfig, RasterSource, RequestValidators, Srid, TileBeard, TileFilter, TileKey,
};
use tracing::info;

use crate::error::CliError;
use crate::filters;

/// Arguments for the `fetch` command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Zoom level
    pub zoom: u8,
    /// Tile column (x)
    pub col: u32,
    /// Tile row (y)
    pub row: u32,

    /// Local tile directory, or the cache directory when combined with
    /// --url or --source
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Remote origin base URL
    #[arg(long)]
    pub url: Option<String>,

    /// Georeferenced raster to generate tiles from (requires a world file)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// EPSG code for generated tiles: 4326 or 3857
    #[arg(long, default_value = "4326")]
    pub srid: String,

    /// Key-to-path layout
    #[arg(long, default_value = tilebeard::DEFAULT_TEMPLATE)]
    pub template: String,

    /// Gzip level (1-9); 0 disables compression
    #[arg(long, default_value_t = 0)]
    pub compresslevel: u32,

    /// Write the tile body to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Invert tile colors before encoding
    #[arg(long)]
    pub invert: bool,
}

/// Run the fetch command.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let srid = Srid::from_code(&args.srid)?;

    let mut config = BeardConfig::new()
        .with_template(args.template)
        .with_compresslevel(args.compresslevel);
    if let Some(path) = args.path {
        config = config.with_path(path);
    }
    if let Some(url) = args.url {
        config = config.with_url(url);
    }
    if let Some(source) = args.source {
        config = config.with_source(Arc::new(RasterSource::new(source).with_srid(srid)));
    }

    let beard = TileBeard::new(config)?;
    let key = TileKey::new(args.zoom, args.col, args.row);

    let filter: Option<Box<TileFilter>> = if args.invert {
        Some(Box::new(|bytes: &[u8]| filters::invert(bytes)))
    } else {
        None
    };

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;
    let response = runtime.block_on(async {
        beard
            .serve(key, &RequestValidators::default(), filter.as_deref())
            .await
    });

    info!(tile = %key, status = response.status, "Fetched tile");
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
