//! Coordinate types shared across the crate.

use thiserror::Error;

/// Errors from coordinate handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// SRID is not one of the supported codes.
    #[error("invalid or unsupported SRID: {0} (use 4326 or 3857)")]
    InvalidSrid(String),
}

/// Spatial reference system for tile bounding boxes.
///
/// Only the two systems the slippy-map world actually uses are supported:
/// geographic WGS 84 degrees and spherical-mercator meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Srid {
    /// WGS 84 geographic coordinates, degrees.
    #[default]
    Epsg4326,
    /// Web Mercator projected coordinates, meters.
    Epsg3857,
}

impl Srid {
    /// Parses an EPSG code string (`"4326"` or `"3857"`).
    pub fn from_code(code: &str) -> Result<Self, CoordError> {
        match code {
            "4326" => Ok(Srid::Epsg4326),
            "3857" => Ok(Srid::Epsg3857),
            other => Err(CoordError::InvalidSrid(other.to_string())),
        }
    }

    /// The EPSG code as a string.
    pub fn code(&self) -> &'static str {
        match self {
            Srid::Epsg4326 => "4326",
            Srid::Epsg3857 => "3857",
        }
    }
}

/// Geographic bounding box in the order (west, south, east, north).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BBox {
    /// Width of the box in ground units.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height of the box in ground units.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Length of the box diagonal, used to scale simplification tolerances.
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// Returns the box expanded on every side by `ratio` of its own
    /// width/height. Vector sources use this to clip with a margin so
    /// geometries are not cut exactly at tile seams.
    pub fn buffered(&self, ratio: f64) -> BBox {
        let dx = self.width() * ratio;
        let dy = self.height() * ratio;
        BBox {
            west: self.west - dx,
            south: self.south - dy,
            east: self.east + dx,
            north: self.north + dy,
        }
    }
}

/// Integer pixel offsets into a raster: `left`/`top` origin, exclusive
/// `right`/`bottom`. Offsets may be negative or exceed the raster size;
/// the consumer clamps them against the actual pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}
