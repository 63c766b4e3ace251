//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the terminal with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] tilebeard::ConfigError),

    #[error("{0}")]
    InvalidSrid(#[from] tilebeard::CoordError),

    #[error("invalid cluster configuration: {0}")]
    ConfigFile(String),

    #[error("failed to start async runtime: {0}")]
    Runtime(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    #[error("failed to read cache statistics: {0}")]
    CacheStats(String),

    #[error("failed to clear cache: {0}")]
    CacheClear(String),
}
