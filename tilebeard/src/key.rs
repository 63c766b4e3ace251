//! Tile keys and path templates.
//!
//! A `TileKey` addresses a single tile by (zoom, col, row). A `PathTemplate`
//! renders a key into the relative path used both for the disk cache layout
//! and for remote origin URLs, e.g. `12/654/1583.png`.

use std::fmt;

/// Coordinates addressing a single tile.
///
/// Row increases southward and col increases eastward, the standard
/// slippy-map convention. Equal triples are equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Zoom level.
    pub zoom: u8,
    /// Tile column (X coordinate in the tile grid).
    pub col: u32,
    /// Tile row (Y coordinate in the tile grid).
    pub row: u32,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(zoom: u8, col: u32, row: u32) -> Self {
        Self { zoom, col, row }
    }

    /// Parses a path-shaped key such as `"12/654/1583.png"`.
    ///
    /// Only the trailing three components matter; an extension on the last
    /// component is ignored. Returns `None` when fewer than three components
    /// are present or any of them is not a non-negative integer.
    pub fn from_path(path: &str) -> Option<Self> {
        let mut parts = path.split('/').rev().filter(|p| !p.is_empty());
        let last = parts.next()?;
        let row_str = last.split('.').next()?;
        let row = row_str.parse().ok()?;
        let col = parts.next()?.parse().ok()?;
        let zoom = parts.next()?.parse().ok()?;
        Some(Self { zoom, col, row })
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// Template rendering a [`TileKey`] into a relative path or URL suffix.
///
/// Recognized placeholders are `{z}`, `{x}` (column) and `{y}` (row). The
/// text after the final `.` is the format extension, used for Content-Type
/// resolution.
///
/// # Example
///
/// ```
/// use tilebeard::{PathTemplate, TileKey};
///
/// let template = PathTemplate::new("{z}/{x}/{y}.png");
/// assert_eq!(template.render(TileKey::new(12, 654, 1583)), "12/654/1583.png");
/// assert_eq!(template.extension(), "png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    template: String,
}

/// Default cache-storage and URL layout.
pub const DEFAULT_TEMPLATE: &str = "{z}/{x}/{y}.png";

impl Default for PathTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PathTemplate {
    /// Creates a template from a pattern string.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Renders the template for a tile key.
    pub fn render(&self, key: TileKey) -> String {
        self.template
            .replace("{z}", &key.zoom.to_string())
            .replace("{x}", &key.col.to_string())
            .replace("{y}", &key.row.to_string())
    }

    /// The format extension of the template, lowercased; empty when the
    /// template carries no extension.
    pub fn extension(&self) -> String {
        match self.template.rsplit_once('.') {
            Some((_, ext)) if !ext.contains('/') => ext.to_ascii_lowercase(),
            _ => String::new(),
        }
    }
}
