//! Georeference loading.
//!
//! A georeference maps a raster's pixel grid to geographic coordinates. It
//! is derived from a world-file side-car (the six-number ESRI format) plus
//! the raster's pixel dimensions, and is immutable for the lifetime of the
//! loaded file.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::coord::BBox;

/// Errors from georeference loading.
#[derive(Debug, Error)]
pub enum GeorefError {
    /// World file could not be read.
    #[error("failed to read world file: {0}")]
    Io(#[from] std::io::Error),

    /// World file did not contain six parsable numbers.
    #[error("malformed world file: {0}")]
    Malformed(String),

    /// Parsed values violate the georeference invariants.
    #[error("invalid georeference: {0}")]
    Invalid(String),
}

/// The six numbers mapping a raster's pixel grid to geographic coordinates.
///
/// Invariants: `xres > 0`, `yres > 0`, `north > south`, `east > west`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    /// Ground units per pixel, horizontal.
    pub xres: f64,
    /// Ground units per pixel, vertical (positive; world files store it
    /// negated).
    pub yres: f64,
    /// Northern edge of the raster.
    pub north: f64,
    /// Eastern edge of the raster.
    pub east: f64,
    /// Southern edge of the raster.
    pub south: f64,
    /// Western edge of the raster.
    pub west: f64,
}

impl Georeference {
    /// Builds a georeference from explicit values, checking invariants.
    pub fn from_parts(
        xres: f64,
        yres: f64,
        north: f64,
        east: f64,
        south: f64,
        west: f64,
    ) -> Result<Self, GeorefError> {
        if xres <= 0.0 || yres <= 0.0 {
            return Err(GeorefError::Invalid(format!(
                "pixel resolution must be positive (xres={xres}, yres={yres})"
            )));
        }
        if north <= south || east <= west {
            return Err(GeorefError::Invalid(format!(
                "degenerate extent (N={north}, S={south}, E={east}, W={west})"
            )));
        }
        Ok(Self {
            xres,
            yres,
            north,
            east,
            south,
            west,
        })
    }

    /// Loads the georeference for a raster from its world-file side-car.
    ///
    /// The world file holds resolution and the upper-left corner; the other
    /// corners are derived from the raster's pixel dimensions.
    ///
    /// # Arguments
    ///
    /// * `image_path` - Path of the raster; the world-file name is derived
    ///   from it
    /// * `width`, `height` - Raster dimensions in pixels
    pub fn load(image_path: &Path, width: u32, height: u32) -> Result<Self, GeorefError> {
        let world_path = world_file_path(image_path);
        let text = std::fs::read_to_string(&world_path)?;
        Self::parse(&text, width, height)
    }

    /// Parses world-file text given the raster dimensions.
    ///
    /// Lines are: xres, x-skew, y-skew, negative yres, upper-left X,
    /// upper-left Y. Skew terms are not supported and must be zero.
    pub fn parse(text: &str, width: u32, height: u32) -> Result<Self, GeorefError> {
        let values: Vec<f64> = text
            .split_whitespace()
            .take(6)
            .map(|line| {
                line.trim().parse::<f64>().map_err(|e| {
                    GeorefError::Malformed(format!("bad number {:?}: {}", line.trim(), e))
                })
            })
            .collect::<Result<_, _>>()?;
        if values.len() < 6 {
            return Err(GeorefError::Malformed(format!(
                "expected 6 values, found {}",
                values.len()
            )));
        }
        if values[1] != 0.0 || values[2] != 0.0 {
            return Err(GeorefError::Invalid(
                "skewed rasters are not supported".to_string(),
            ));
        }

        let xres = values[0];
        let yres = -values[3];
        let west = values[4];
        let north = values[5];
        let east = west + xres * width as f64;
        let south = north - yres * height as f64;
        Self::from_parts(xres, yres, north, east, south, west)
    }

    /// Whether a geographic box overlaps the raster's extent.
    ///
    /// Partial overlap counts; only fully disjoint boxes fail. This gate
    /// runs before any decode or crop work is attempted.
    pub fn intersects(&self, bbox: &BBox) -> bool {
        !(bbox.west > self.east
            || bbox.south > self.north
            || bbox.east < self.west
            || bbox.north < self.south)
    }

    /// The raster extent as a bounding box.
    pub fn bbox(&self) -> BBox {
        BBox {
            west: self.west,
            south: self.south,
            east: self.east,
            north: self.north,
        }
    }
}

/// Derives the world-file path for a raster path.
///
/// Follows the ESRI convention of keeping the first and last character of
/// the extension and appending `w`: `tile.tif` → `tile.tfw`, `tile.png` →
/// `tile.pgw`. Extensions with fewer than three characters just get `w`
/// appended.
pub fn world_file_path(image_path: &Path) -> PathBuf {
    let ext = image_path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut chars = ext.chars();
    let world_ext = match (chars.next(), ext.chars().last()) {
        (Some(first), Some(last)) if ext.len() >= 3 => format!("{first}{last}w"),
        _ => format!("{ext}w"),
    };
    image_path.with_extension(world_ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WORLD: &str = "0.5\n0.0\n0.0\n-0.5\n100.0\n50.0\n";

    #[test]
    fn test_parse_world_file() {
        let georef = Georeference::parse(WORLD, 200, 100).unwrap();
        assert_eq!(georef.xres, 0.5);
        assert_eq!(georef.yres, 0.5);
        assert_eq!(georef.west, 100.0);
        assert_eq!(georef.north, 50.0);
        assert_eq!(georef.east, 200.0); // 100 + 0.5 * 200
        assert_eq!(georef.south, 0.0); // 50 - 0.5 * 100
    }

    #[test]
    fn test_parse_rejects_short_file() {
        let err = Georeference::parse("1.0\n0.0\n0.0\n", 10, 10).unwrap_err();
        assert!(matches!(err, GeorefError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_skew() {
        let err = Georeference::parse("1.0\n0.1\n0.0\n-1.0\n0.0\n0.0\n", 10, 10).unwrap_err();
        assert!(matches!(err, GeorefError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let err = Georeference::parse("1.0\nzero\n0.0\n-1.0\n0.0\n0.0\n", 10, 10).unwrap_err();
        assert!(matches!(err, GeorefError::Malformed(_)));
    }

    #[test]
    fn test_from_parts_rejects_negative_resolution() {
        assert!(Georeference::from_parts(-1.0, 1.0, 10.0, 10.0, 0.0, 0.0).is_err());
        assert!(Georeference::from_parts(1.0, 0.0, 10.0, 10.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_from_parts_rejects_degenerate_extent() {
        assert!(Georeference::from_parts(1.0, 1.0, 0.0, 10.0, 10.0, 0.0).is_err());
    }

    #[test]
    fn test_world_file_path_convention() {
        assert_eq!(
            world_file_path(Path::new("/data/tile.tif")),
            PathBuf::from("/data/tile.tfw")
        );
        assert_eq!(
            world_file_path(Path::new("scan.png")),
            PathBuf::from("scan.pgw")
        );
        assert_eq!(
            world_file_path(Path::new("ortho.jpeg")),
            PathBuf::from("ortho.jgw")
        );
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("area.tif");
        let mut f = std::fs::File::create(world_file_path(&image)).unwrap();
        f.write_all(WORLD.as_bytes()).unwrap();

        let georef = Georeference::load(&image, 200, 100).unwrap();
        assert_eq!(georef.east, 200.0);
    }

    #[test]
    fn test_load_missing_world_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("missing.tif");
        assert!(matches!(
            Georeference::load(&image, 10, 10),
            Err(GeorefError::Io(_))
        ));
    }

    #[test]
    fn test_intersects() {
        let georef = Georeference::from_parts(1.0, 1.0, 10.0, 10.0, -10.0, -10.0).unwrap();

        let inside = BBox {
            west: -5.0,
            south: -5.0,
            east: 5.0,
            north: 5.0,
        };
        assert!(georef.intersects(&inside));

        // Partial overlap at the top edge still intersects
        let partial = BBox {
            west: -5.0,
            south: 8.0,
            east: 5.0,
            north: 15.0,
        };
        assert!(georef.intersects(&partial));

        let outside = BBox {
            west: 20.0,
            south: 20.0,
            east: 21.0,
            north: 21.0,
        };
        assert!(!georef.intersects(&outside));

        let below = BBox {
            west: 0.0,
            south: -30.0,
            east: 1.0,
            north: -20.0,
        };
        assert!(!georef.intersects(&below));
    }
}
