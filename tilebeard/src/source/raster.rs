//! Raster tile source: crops and resamples a georeferenced image.

use std::path::PathBuf;
use std::time::SystemTime;

use bytes::Bytes;
use image::imageops::FilterType;
use tracing::debug;

use super::{SourceError, TileSource};
use crate::coord::{bbox_to_pixel_window, tile_to_bbox, Srid};
use crate::georef::Georeference;
use crate::key::TileKey;
use crate::BoxFuture;

/// Default output tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Generates tiles on demand by cropping a larger georeferenced raster.
///
/// The georeference comes from the raster's world-file side-car. Pixel
/// decoding, cropping and resampling are delegated to the `image` crate and
/// run on the blocking thread pool. The out-of-bounds gate runs before any
/// pixel decode: only the image header is read to obtain dimensions.
///
/// # Example
///
/// ```ignore
/// use tilebeard::source::RasterSource;
///
/// let source = RasterSource::new("/data/ortho.tif")
///     .with_srid(tilebeard::Srid::Epsg3857)
///     .with_tile_size(512);
/// ```
pub struct RasterSource {
    image_path: PathBuf,
    srid: Srid,
    tile_size: u32,
    format: String,
}

impl RasterSource {
    /// Creates a source for a raster file with a world-file side-car.
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            srid: Srid::default(),
            tile_size: DEFAULT_TILE_SIZE,
            format: "png".to_string(),
        }
    }

    /// Sets the reference system tile boxes are computed in.
    pub fn with_srid(mut self, srid: Srid) -> Self {
        self.srid = srid;
        self
    }

    /// Sets the output tile edge length in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Path of the backing raster.
    pub fn image_path(&self) -> &PathBuf {
        &self.image_path
    }
}

impl TileSource for RasterSource {
    fn format(&self) -> &str {
        &self.format
    }

    fn modified(&self) -> BoxFuture<'_, Result<SystemTime, SourceError>> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(&self.image_path).await?;
            Ok(metadata.modified()?)
        })
    }

    fn generate(&self, key: TileKey) -> BoxFuture<'_, Result<Bytes, SourceError>> {
        let path = self.image_path.clone();
        let srid = self.srid;
        let tile_size = self.tile_size;
        Box::pin(async move {
            let bbox = tile_to_bbox(key, srid);
            let bytes = tokio::task::spawn_blocking(move || -> Result<Bytes, SourceError> {
                // Header-only read; no pixel decode yet
                let (width, height) = image::image_dimensions(&path)
                    .map_err(|e| SourceError::Failed(format!("failed to read header: {e}")))?;
                let georef = Georeference::load(&path, width, height)?;
                if !georef.intersects(&bbox) {
                    return Err(SourceError::OutOfBounds);
                }

                let window = bbox_to_pixel_window(&bbox, &georef);
                // Clamp against the raster's actual pixel dimensions
                let left = window.left.clamp(0, width as i64) as u32;
                let top = window.top.clamp(0, height as i64) as u32;
                let right = window.right.clamp(0, width as i64) as u32;
                let bottom = window.bottom.clamp(0, height as i64) as u32;
                if right <= left || bottom <= top {
                    return Err(SourceError::OutOfBounds);
                }

                let source = image::open(&path)
                    .map_err(|e| SourceError::Failed(format!("failed to decode: {e}")))?;
                let tile = source
                    .crop_imm(left, top, right - left, bottom - top)
                    .resize_exact(tile_size, tile_size, FilterType::Triangle);

                let mut encoded = std::io::Cursor::new(Vec::new());
                tile.write_to(&mut encoded, image::ImageFormat::Png)
                    .map_err(|e| SourceError::Failed(format!("failed to encode: {e}")))?;

                debug!(
                    tile = %key,
                    window_px = (right - left) * (bottom - top),
                    size_bytes = encoded.get_ref().len(),
                    "Generated raster tile"
                );
                Ok(Bytes::from(encoded.into_inner()))
            })
            .await
            .map_err(|e| SourceError::Failed(format!("generation task failed: {e}")))??;
            Ok(bytes)
        })
    }
}
