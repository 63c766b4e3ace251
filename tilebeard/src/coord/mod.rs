//! Coordinate conversion module
//!
//! Provides conversions between slippy-map tile coordinates (zoom/col/row)
//! and geographic bounding boxes, and from geographic bounding boxes to
//! pixel windows of a georeferenced raster.

mod types;

pub use types::{BBox, CoordError, PixelWindow, Srid};

use std::f64::consts::PI;

use crate::georef::Georeference;
use crate::key::TileKey;

/// Earth radius in meters used by the spherical-mercator (EPSG:3857) grid.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Converts a tile key to the geographic bounding box it covers.
///
/// Uses the standard slippy-map formulas: the north-west corner comes from
/// (col, row) and the south-east corner from (col + 1, row + 1).
///
/// # Arguments
///
/// * `key` - Tile coordinates (zoom, col, row)
/// * `srid` - Output reference system; degrees for EPSG:4326, meters for
///   EPSG:3857
#[inline]
pub fn tile_to_bbox(key: TileKey, srid: Srid) -> BBox {
    match srid {
        Srid::Epsg4326 => {
            let (west, north) = tile_to_lon_lat(key.zoom, key.col, key.row);
            let (east, south) = tile_to_lon_lat(key.zoom, key.col + 1, key.row + 1);
            BBox {
                west,
                south,
                east,
                north,
            }
        }
        Srid::Epsg3857 => {
            let n = 2.0_f64.powi(key.zoom as i32);
            let span = 2.0 * PI * EARTH_RADIUS_M;
            let x = |col: u32| col as f64 / n * span - span / 2.0;
            let y = |row: u32| span / 2.0 - row as f64 / n * span;
            BBox {
                west: x(key.col),
                south: y(key.row + 1),
                east: x(key.col + 1),
                north: y(key.row),
            }
        }
    }
}

/// Converts a tile corner to longitude/latitude in degrees.
///
/// `lon = col / 2^zoom * 360 - 180`,
/// `lat = atan(sinh(pi * (1 - 2 * row / 2^zoom)))`.
#[inline]
fn tile_to_lon_lat(zoom: u8, col: u32, row: u32) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let lon = col as f64 / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * row as f64 / n)).sinh().atan();
    (lon, lat_rad.to_degrees())
}

/// Converts a geographic bounding box to integer pixel offsets of a raster.
///
/// The origin is rounded with `floor` and the extent with `ceil` so the
/// window always *covers* the requested box, never under-covers it. The
/// caller is responsible for clamping against the raster's actual pixel
/// dimensions.
///
/// # Arguments
///
/// * `bbox` - Geographic box in the raster's reference system
/// * `georef` - The raster's georeference
#[inline]
pub fn bbox_to_pixel_window(bbox: &BBox, georef: &Georeference) -> PixelWindow {
    let left = ((bbox.west - georef.west) / georef.xres).floor() as i64;
    let top = ((georef.north - bbox.north) / georef.yres).floor() as i64;
    let right = left + ((bbox.east - bbox.west) / georef.xres).ceil() as i64;
    let bottom = top + ((bbox.north - bbox.south) / georef.yres).ceil() as i64;
    PixelWindow {
        left,
        top,
        right,
        bottom,
    }
}
