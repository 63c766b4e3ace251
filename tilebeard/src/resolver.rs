//! Per-tile resolution: read-through cache, origin strategies, validators.
//!
//! A [`Tile`] is the memoized record for one key. Its body cell is a
//! `tokio::sync::Mutex<Option<Bytes>>`; resolution happens with the lock
//! held, so concurrent first requests for the same key collapse into a
//! single upstream fetch or generation while later waiters reuse the
//! result. A failed resolution leaves the cell empty, so the next request
//! simply retries.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::conditional::Validators;
use crate::error::ResolveError;
use crate::fetch::{AsyncHttpClient, FetchError};
use crate::headers::{etag_for_bytes, etag_for_file, etag_for_generated, http_date};
use crate::key::TileKey;
use crate::source::{SourceError, TileSource};
use crate::store::DiskStore;

/// How a tile's bytes come into being.
pub enum Strategy {
    /// Serve a pre-existing file; a missing file is a definitive miss.
    Local { path: PathBuf },

    /// Fetch from a remote origin, optionally writing through to disk.
    Proxy {
        url: String,
        cache_path: Option<PathBuf>,
        client: Arc<dyn AsyncHttpClient>,
    },

    /// Generate from a source dataset, optionally writing through to disk.
    Generated {
        source: Arc<dyn TileSource>,
        cache_path: Option<PathBuf>,
    },
}

/// Memoized resolution record for one tile key.
pub struct Tile {
    key: TileKey,
    strategy: Strategy,
    store: DiskStore,
    body: Mutex<Option<Bytes>>,
}

impl Tile {
    pub fn new(key: TileKey, strategy: Strategy, store: DiskStore) -> Self {
        Self {
            key,
            strategy,
            store,
            body: Mutex::new(None),
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Whether the in-memory body is populated.
    pub async fn is_resolved(&self) -> bool {
        self.body.lock().await.is_some()
    }

    /// Resolves the tile's bytes.
    ///
    /// The body cell's lock is held for the whole resolution, which is what
    /// makes resolution single-flight per key. On failure the cell stays
    /// empty and the error is returned to every current waiter in turn,
    /// each retrying the resolution itself.
    pub async fn resolve(&self) -> Result<Bytes, ResolveError> {
        let mut cell = self.body.lock().await;
        if let Some(ref bytes) = *cell {
            debug!(tile = %self.key, "Tile served from memory");
            return Ok(bytes.clone());
        }

        let bytes = match &self.strategy {
            Strategy::Local { path } => self
                .store
                .read(path)
                .await?
                .ok_or(ResolveError::NotFound)?,
            Strategy::Proxy {
                url,
                cache_path,
                client,
            } => {
                if let Some(cached) = self.read_cache(cache_path.as_deref()).await? {
                    cached
                } else {
                    debug!(tile = %self.key, url = %url, "Fetching tile from remote origin");
                    let fetched = client.get(url).await.map_err(|e| match e {
                        FetchError::NotFound => ResolveError::NotFound,
                        FetchError::Http(message) => ResolveError::Upstream(message),
                    })?;
                    self.write_cache(cache_path.as_deref(), &fetched).await;
                    fetched
                }
            }
            Strategy::Generated { source, cache_path } => {
                if let Some(cached) = self.read_cache(cache_path.as_deref()).await? {
                    cached
                } else {
                    debug!(tile = %self.key, "Generating tile from source");
                    let generated = source.generate(self.key).await.map_err(|e| match e {
                        SourceError::OutOfBounds => ResolveError::OutOfBounds,
                        other => ResolveError::Upstream(other.to_string()),
                    })?;
                    self.write_cache(cache_path.as_deref(), &generated).await;
                    generated
                }
            }
        };

        *cell = Some(bytes.clone());
        Ok(bytes)
    }

    /// Computes the tile's current validators.
    ///
    /// Recomputed fresh on every request rather than memoized, so a changed
    /// file mtime is observed even while body bytes are served from memory.
    /// Returns `None` when no validator source is available yet (e.g. an
    /// unresolved, uncached proxy tile).
    pub async fn validators(&self) -> Option<Validators> {
        match &self.strategy {
            Strategy::Local { path } => {
                let mtime = self.store.mtime(path).await?;
                Some(Validators {
                    last_modified: Some(http_date(mtime)),
                    etag: etag_for_file(mtime, path),
                })
            }
            Strategy::Proxy { cache_path, .. } => {
                if let Some(path) = cache_path {
                    if let Some(mtime) = self.store.mtime(path).await {
                        return Some(Validators {
                            last_modified: Some(http_date(mtime)),
                            etag: etag_for_file(mtime, path),
                        });
                    }
                }
                // Uncached proxy tile: content-identity etag once resolved
                let body = self.body.lock().await;
                body.as_ref().map(|bytes| Validators {
                    last_modified: None,
                    etag: etag_for_bytes(bytes),
                })
            }
            Strategy::Generated { source, cache_path } => {
                if let Some(path) = cache_path {
                    if let Some(mtime) = self.store.mtime(path).await {
                        return Some(Validators {
                            last_modified: Some(http_date(mtime)),
                            etag: etag_for_file(mtime, path),
                        });
                    }
                }
                match source.modified().await {
                    Ok(modified) => Some(Validators {
                        last_modified: Some(http_date(modified)),
                        etag: etag_for_generated(modified, self.key),
                    }),
                    Err(e) => {
                        debug!(tile = %self.key, error = %e, "No source timestamp for validators");
                        None
                    }
                }
            }
        }
    }

    async fn read_cache(
        &self,
        cache_path: Option<&std::path::Path>,
    ) -> Result<Option<Bytes>, ResolveError> {
        let Some(path) = cache_path else {
            return Ok(None);
        };
        let hit = self.store.read(path).await?;
        if hit.is_some() {
            debug!(tile = %self.key, path = %path.display(), "Tile cache hit");
        }
        Ok(hit)
    }

    /// Write-back is awaited so validators derived from the cache file are
    /// coherent with the response, but a write failure only costs the
    /// caching, not the response.
    async fn write_cache(&self, cache_path: Option<&std::path::Path>, bytes: &Bytes) {
        let Some(path) = cache_path else {
            return;
        };
        if let Err(e) = self.store.write(path, bytes.clone()).await {
            warn!(
                tile = %self.key,
                path = %path.display(),
                error = %e,
                "Failed to write tile to cache"
            );
        }
    }
}
