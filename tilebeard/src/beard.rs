//! The tile adapter: configuration, request orchestration, responses.
//!
//! `TileBeard` glues the pieces together: it owns a registry of memoized
//! tile records, picks the origin strategy once at construction, evaluates
//! conditional requests, and maps every resolution outcome to a well-formed
//! response triple. It never panics on a request and never lets an error
//! escape as anything but a response.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::conditional::{not_modified, RequestValidators, Validators};
use crate::error::{ConfigError, ResolveError};
use crate::fetch::{AsyncHttpClient, ReqwestClient};
use crate::headers::content_type;
use crate::key::{PathTemplate, TileKey, DEFAULT_TEMPLATE};
use crate::origin::{select_origin, Origin};
use crate::registry::TileRegistry;
use crate::resolver::Strategy;
use crate::source::TileSource;
use crate::store::DiskStore;

/// Transform applied to tile bytes before compression, e.g. a pixel filter.
pub type TileFilter = dyn Fn(&[u8]) -> Vec<u8> + Send + Sync;

/// Adapter configuration.
///
/// Deserializable from JSON for cluster dataset maps; a generator source
/// cannot come from config and is attached with [`BeardConfig::with_source`].
#[derive(Clone, Deserialize)]
pub struct BeardConfig {
    /// Local tile directory (sole origin), or the cache directory for the
    /// proxy and generator origins.
    pub path: Option<PathBuf>,
    /// Remote origin base URL.
    pub url: Option<String>,
    /// Key-to-path layout, `{z}/{x}/{y}.png` by default.
    #[serde(default = "default_template")]
    pub template: String,
    /// Gzip level; compression is active for `1..=9`.
    #[serde(default)]
    pub compresslevel: u32,
    /// On-demand tile generator.
    #[serde(skip)]
    pub source: Option<Arc<dyn TileSource>>,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

impl Default for BeardConfig {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            template: default_template(),
            compresslevel: 0,
            source: None,
        }
    }
}

impl BeardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_source(mut self, source: Arc<dyn TileSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_compresslevel(mut self, level: u32) -> Self {
        self.compresslevel = level;
        self
    }
}

/// Response triple handed to whatever HTTP surface embeds the adapter.
#[derive(Debug, Clone)]
pub struct TileResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Origin wiring fixed at construction.
enum AdapterOrigin {
    Local {
        base: PathBuf,
    },
    Proxy {
        base_url: String,
        cache_base: Option<PathBuf>,
        client: Arc<dyn AsyncHttpClient>,
    },
    Generated {
        source: Arc<dyn TileSource>,
        cache_base: Option<PathBuf>,
    },
}

/// Tile-serving adapter for a single dataset.
pub struct TileBeard {
    origin: AdapterOrigin,
    template: PathTemplate,
    compresslevel: u32,
    store: DiskStore,
    registry: TileRegistry,
}

impl TileBeard {
    /// Builds an adapter, constructing its own HTTP client when the config
    /// selects the proxy origin.
    pub fn new(config: BeardConfig) -> Result<Self, ConfigError> {
        Self::build(config, None, DiskStore::new())
    }

    /// Builds an adapter with an injected HTTP client.
    pub fn with_client(
        config: BeardConfig,
        client: Arc<dyn AsyncHttpClient>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Some(client), DiskStore::new())
    }

    pub(crate) fn build(
        config: BeardConfig,
        client: Option<Arc<dyn AsyncHttpClient>>,
        store: DiskStore,
    ) -> Result<Self, ConfigError> {
        let selected = select_origin(
            config.path.is_some(),
            config.url.is_some(),
            config.source.is_some(),
        )?;

        let origin = match selected {
            Origin::Local => AdapterOrigin::Local {
                // The selector guarantees path is present for Local
                base: config.path.ok_or(ConfigError::NoOrigin)?,
            },
            Origin::Proxy => {
                let client = match client {
                    Some(client) => client,
                    None => Arc::new(
                        ReqwestClient::new().map_err(|e| ConfigError::Client(e.to_string()))?,
                    ),
                };
                AdapterOrigin::Proxy {
                    base_url: config
                        .url
                        .map(|u| u.trim_end_matches('/').to_string())
                        .ok_or(ConfigError::NoOrigin)?,
                    cache_base: config.path,
                    client,
                }
            }
            Origin::Generated => AdapterOrigin::Generated {
                source: config.source.ok_or(ConfigError::NoOrigin)?,
                cache_base: config.path,
            },
        };

        info!(
            origin = origin.label(),
            template = %config.template,
            compresslevel = config.compresslevel,
            "Created tile adapter"
        );
        Ok(Self {
            origin,
            template: PathTemplate::new(config.template),
            compresslevel: config.compresslevel,
            store,
            registry: TileRegistry::new(),
        })
    }

    /// Number of distinct keys served so far.
    pub fn entry_count(&self) -> usize {
        self.registry.entry_count()
    }

    /// Serves a tile addressed by a path such as `"12/654/1583.png"`.
    /// An unparseable path is a 404.
    pub async fn serve_path(
        &self,
        path: &str,
        request: &RequestValidators,
        filter: Option<&TileFilter>,
    ) -> TileResponse {
        match TileKey::from_path(path) {
            Some(key) => self.serve(key, request, filter).await,
            None => {
                debug!(path, "Rejected unparseable tile path");
                not_found_response()
            }
        }
    }

    /// Serves a tile.
    ///
    /// # Returns
    ///
    /// - 304 when the request validators match the tile's current ones
    /// - 200 with the (filtered, optionally gzipped) tile bytes
    /// - 404 for a confirmed-absent or out-of-bounds tile
    /// - 502 when the origin could not be consulted
    pub async fn serve(
        &self,
        key: TileKey,
        request: &RequestValidators,
        filter: Option<&TileFilter>,
    ) -> TileResponse {
        let tile = self
            .registry
            .get_or_create(key, &self.store, || self.strategy_for(key));

        // Validators are recomputed on every request so mtime changes are
        // observed even when the body comes from memory.
        if let Some(validators) = tile.validators().await {
            if not_modified(request, &validators) {
                debug!(tile = %key, "Conditional match, serving 304");
                return self.not_modified_response(&validators);
            }
        }

        match tile.resolve().await {
            Ok(body) => {
                // Fresh validators: write-back may have just created the
                // cache file these are derived from.
                let validators = tile.validators().await;
                self.ok_response(body, validators, filter)
            }
            Err(ResolveError::NotFound) => {
                debug!(tile = %key, "Tile not found");
                not_found_response()
            }
            Err(ResolveError::OutOfBounds) => {
                debug!(tile = %key, "Tile out of source bounds");
                not_found_response()
            }
            Err(e) => {
                warn!(tile = %key, error = %e, "Tile resolution failed");
                TileResponse {
                    status: 502,
                    headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
                    body: Bytes::from_static(b"upstream failure"),
                }
            }
        }
    }

    fn strategy_for(&self, key: TileKey) -> Strategy {
        let relative = self.template.render(key);
        match &self.origin {
            AdapterOrigin::Local { base } => Strategy::Local {
                path: base.join(relative),
            },
            AdapterOrigin::Proxy {
                base_url,
                cache_base,
                client,
            } => Strategy::Proxy {
                url: format!("{base_url}/{relative}"),
                cache_path: cache_base.as_ref().map(|base| base.join(&relative)),
                client: Arc::clone(client),
            },
            AdapterOrigin::Generated { source, cache_base } => Strategy::Generated {
                source: Arc::clone(source),
                cache_path: cache_base.as_ref().map(|base| base.join(&relative)),
            },
        }
    }

    fn content_type(&self) -> &'static str {
        match &self.origin {
            AdapterOrigin::Generated { source, .. } => content_type(source.format()),
            _ => content_type(&self.template.extension()),
        }
    }

    fn base_headers(&self, validators: Option<&Validators>) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Content-Type".to_string(), self.content_type().to_string()),
            ("Cache-Control".to_string(), "public".to_string()),
        ];
        if let Some(validators) = validators {
            headers.push(("ETag".to_string(), validators.etag.clone()));
            if let Some(ref last_modified) = validators.last_modified {
                headers.push(("Last-Modified".to_string(), last_modified.clone()));
            }
        }
        headers
    }

    fn not_modified_response(&self, validators: &Validators) -> TileResponse {
        TileResponse {
            status: 304,
            headers: self.base_headers(Some(validators)),
            body: Bytes::from_static(b"not modified"),
        }
    }

    fn ok_response(
        &self,
        body: Bytes,
        validators: Option<Validators>,
        filter: Option<&TileFilter>,
    ) -> TileResponse {
        let mut headers = self.base_headers(validators.as_ref());
        let mut body = match filter {
            Some(filter) => Bytes::from(filter(&body)),
            None => body,
        };

        if (1..10).contains(&self.compresslevel) {
            match gzip(&body, self.compresslevel) {
                Ok(compressed) => {
                    headers.push(("Content-Encoding".to_string(), "gzip".to_string()));
                    headers.push(("Vary".to_string(), "Accept-Encoding".to_string()));
                    body = Bytes::from(compressed);
                }
                Err(e) => {
                    warn!(error = %e, "Gzip failed, serving identity encoding");
                }
            }
        }
        headers.push(("Content-Length".to_string(), body.len().to_string()));

        TileResponse {
            status: 200,
            headers,
            body,
        }
    }
}

impl AdapterOrigin {
    fn label(&self) -> &'static str {
        match self {
            AdapterOrigin::Local { .. } => "local",
            AdapterOrigin::Proxy { .. } => "proxy",
            AdapterOrigin::Generated { .. } => "generated",
        }
    }
}

fn not_found_response() -> TileResponse {
    TileResponse {
        status: 404,
        headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        body: Bytes::from_static(b"not found"),
    }
}

fn gzip(body: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(body)?;
    encoder.finish()
}
