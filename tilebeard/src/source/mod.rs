//! On-demand tile generation sources.
//!
//! A [`TileSource`] produces tile bytes for the `Generated` origin by
//! cropping a georeferenced raster or clipping vector features. Sources
//! expose a modification timestamp so the adapter can derive validators.
//!
//! The trait uses boxed futures for dyn compatibility; adapters hold an
//! `Arc<dyn TileSource>`.

mod raster;
mod vector;

pub use raster::RasterSource;
pub use vector::{GeometryClipper, VectorSource};

use std::time::SystemTime;

use bytes::Bytes;
use thiserror::Error;

use crate::key::TileKey;
use crate::BoxFuture;

/// Errors from tile generation.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested tile does not intersect the source's extent.
    #[error("tile does not intersect the source extent")]
    OutOfBounds,

    /// The source's georeference could not be loaded.
    #[error(transparent)]
    Georef(#[from] crate::georef::GeorefError),

    /// I/O failure while reading the source dataset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The generation step itself failed (decode, encode, clip).
    #[error("generation failed: {0}")]
    Failed(String),
}

/// A capability that generates tile bytes on demand.
pub trait TileSource: Send + Sync {
    /// Format extension of the generated tiles (e.g. `"png"`,
    /// `"geojson"`), used for Content-Type resolution.
    fn format(&self) -> &str;

    /// The source dataset's modification timestamp.
    fn modified(&self) -> BoxFuture<'_, Result<SystemTime, SourceError>>;

    /// Generates the tile bytes for a key.
    fn generate(&self, key: TileKey) -> BoxFuture<'_, Result<Bytes, SourceError>>;
}
