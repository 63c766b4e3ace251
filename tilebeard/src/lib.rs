//! tilebeard - an async tile-serving adapter.
//!
//! Adapts a slippy-map tile pyramid to whatever HTTP surface embeds it.
//! A tile request resolves through one of three origins fixed at
//! configuration time: a local directory of pre-rendered tiles, a remote
//! tile server proxied (and optionally cached) through the adapter, or
//! on-demand generation by cropping a georeferenced raster / clipping a
//! vector dataset. Resolved tiles are memoized in memory, written through
//! to disk, and served with HTTP validators so clients can revalidate
//! cheaply with `304 Not Modified`.
//!
//! # Example
//!
//! ```no_run
//! use tilebeard::{BeardConfig, RequestValidators, TileBeard, TileKey};
//!
//! # async fn example() -> Result<(), tilebeard::ConfigError> {
//! let beard = TileBeard::new(
//!     BeardConfig::new()
//!         .with_url("https://tile.example.org")
//!         .with_path("/var/cache/tiles"),
//! )?;
//! let response = beard
//!     .serve(TileKey::new(12, 654, 1583), &RequestValidators::default(), None)
//!     .await;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;

/// Boxed future alias used by the crate's dyn-compatible async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod beard;
pub mod cluster;
pub mod conditional;
pub mod coord;
pub mod error;
pub mod fetch;
pub mod georef;
pub mod headers;
pub mod key;
pub mod limiter;
pub mod origin;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod store;

pub use beard::{BeardConfig, TileBeard, TileFilter, TileResponse};
pub use cluster::{ClusterBeard, ClusterConfig};
pub use conditional::{not_modified, RequestValidators, Validators};
pub use coord::{bbox_to_pixel_window, tile_to_bbox, BBox, CoordError, PixelWindow, Srid};
pub use error::{ConfigError, ResolveError};
pub use fetch::{AsyncHttpClient, FetchError, ReqwestClient};
pub use georef::{Georeference, GeorefError};
pub use key::{PathTemplate, TileKey, DEFAULT_TEMPLATE};
pub use limiter::IoLimiter;
pub use origin::{select_origin, Origin};
pub use registry::TileRegistry;
pub use resolver::{Strategy, Tile};
pub use source::{GeometryClipper, RasterSource, SourceError, TileSource, VectorSource};
pub use store::{clear_disk_cache, disk_cache_stats, ClearResult, DiskStore};
