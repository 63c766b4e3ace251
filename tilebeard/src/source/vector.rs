//! Vector tile source: clips features of a larger dataset to a tile box.
//!
//! The geometric work (intersection, simplification, serialization) is an
//! external capability behind the [`GeometryClipper`] trait; this module
//! owns the tile-box arithmetic around it: buffering the box so features
//! are not cut exactly at tile seams, and scaling the simplification
//! tolerance to the tile's bounding-box diagonal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;

use super::{SourceError, TileSource};
use crate::coord::{tile_to_bbox, BBox, Srid};
use crate::key::TileKey;
use crate::BoxFuture;

/// Capability performing the geometric clip of a dataset against a box.
///
/// `tolerance` is an absolute simplification tolerance in the box's ground
/// units (already scaled from the configured fraction of the tile
/// diagonal). Implementations run on the blocking thread pool and may do
/// CPU-heavy work.
pub trait GeometryClipper: Send + Sync + 'static {
    /// Clips the dataset to `bbox` and serializes the result.
    fn clip(&self, bbox: &BBox, tolerance: f64) -> Result<Vec<u8>, SourceError>;
}

/// Generates vector tiles on demand by clipping a feature dataset.
pub struct VectorSource<G: GeometryClipper> {
    data_path: PathBuf,
    srid: Srid,
    buffer_ratio: f64,
    simplification: f64,
    format: String,
    clipper: Arc<G>,
}

impl<G: GeometryClipper> VectorSource<G> {
    /// Creates a vector source.
    ///
    /// # Arguments
    ///
    /// * `data_path` - The feature dataset; its mtime drives validators
    /// * `clipper` - The geometry capability doing the actual clipping
    pub fn new(data_path: impl Into<PathBuf>, clipper: G) -> Self {
        Self {
            data_path: data_path.into(),
            srid: Srid::default(),
            buffer_ratio: 0.0,
            simplification: 0.0,
            format: "geojson".to_string(),
            clipper: Arc::new(clipper),
        }
    }

    /// Sets the reference system tile boxes are computed in.
    pub fn with_srid(mut self, srid: Srid) -> Self {
        self.srid = srid;
        self
    }

    /// Sets the clip margin as a ratio of the tile box size. Features are
    /// clipped against the buffered box so geometries continue cleanly
    /// across tile seams.
    pub fn with_buffer_ratio(mut self, ratio: f64) -> Self {
        self.buffer_ratio = ratio;
        self
    }

    /// Sets the simplification tolerance as a fraction of the tile
    /// bounding-box diagonal. Zero disables simplification.
    pub fn with_simplification(mut self, fraction: f64) -> Self {
        self.simplification = fraction;
        self
    }

    /// Sets the format extension of the generated tiles.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl<G: GeometryClipper> TileSource for VectorSource<G> {
    fn format(&self) -> &str {
        &self.format
    }

    fn modified(&self) -> BoxFuture<'_, Result<SystemTime, SourceError>> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(&self.data_path).await?;
            Ok(metadata.modified()?)
        })
    }

    fn generate(&self, key: TileKey) -> BoxFuture<'_, Result<Bytes, SourceError>> {
        let bbox = tile_to_bbox(key, self.srid);
        let clip_box = bbox.buffered(self.buffer_ratio);
        let tolerance = self.simplification * bbox.diagonal();
        let clipper = Arc::clone(&self.clipper);
        Box::pin(async move {
            let features =
                tokio::task::spawn_blocking(move || clipper.clip(&clip_box, tolerance))
                    .await
                    .map_err(|e| SourceError::Failed(format!("clip task failed: {e}")))??;
            Ok(Bytes::from(features))
        })
    }
}
