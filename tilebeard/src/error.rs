//! Error taxonomy for the tile adapter.
//!
//! Construction-time problems are `ConfigError` and are fatal. Per-request
//! problems are `ResolveError`; the adapter maps them to status codes and
//! never lets one escape as anything but a well-formed response.

use thiserror::Error;

/// Fatal configuration errors, raised once at adapter construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// None of path, url, or source was configured.
    #[error("no path, url, or source specified")]
    NoOrigin,

    /// Both a remote url and a generator source were configured; the
    /// adapter cannot pick between the two strategies.
    #[error("both a remote url and a generator source specified")]
    AmbiguousOrigin,

    /// The HTTP client needed for the proxy origin could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Per-request resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Confirmed absent: missing local file with no fallback, or a remote
    /// 404 with no fallback. Maps to 404.
    #[error("tile not found")]
    NotFound,

    /// The requested tile's geography does not intersect the source
    /// extent. Maps to 404, distinct from `NotFound` for logging.
    #[error("requested tile lies outside the source extent")]
    OutOfBounds,

    /// Could not determine: network failure other than 404, or a generator
    /// failure. Maps to 502, never conflated with `NotFound`.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Local I/O failure other than a missing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
