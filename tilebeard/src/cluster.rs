//! Multi-dataset routing.
//!
//! `ClusterBeard` fronts a map of dataset configurations. The trailing
//! three path components address the tile (z, x, y); everything before
//! them names the dataset. Per-dataset adapters are constructed lazily on
//! first request and memoized, but every configuration is validated
//! eagerly at cluster construction so a bad dataset cannot hide until
//! traffic reaches it. All adapters share one disk store, so the cluster's
//! disk I/O is bounded by a single limiter.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::beard::{BeardConfig, TileBeard, TileFilter, TileResponse};
use crate::conditional::RequestValidators;
use crate::error::ConfigError;
use crate::key::TileKey;
use crate::origin::select_origin;
use crate::store::DiskStore;

/// Cluster configuration: a zoom window and a dataset map, loadable from
/// JSON. Generator-backed datasets attach their sources after
/// deserialization via [`BeardConfig::with_source`].
#[derive(Clone, Deserialize)]
pub struct ClusterConfig {
    /// Lowest zoom level served, inclusive.
    #[serde(default)]
    pub minzoom: u8,
    /// Highest zoom level served, inclusive.
    #[serde(default = "default_maxzoom")]
    pub maxzoom: u8,
    /// Dataset id to adapter configuration.
    pub datasets: HashMap<String, BeardConfig>,
}

fn default_maxzoom() -> u8 {
    22
}

/// Routes tile requests across multiple datasets.
pub struct ClusterBeard {
    config: ClusterConfig,
    store: DiskStore,
    adapters: DashMap<String, Arc<TileBeard>>,
}

impl ClusterBeard {
    /// Validates every dataset's origin combination up front.
    pub fn new(config: ClusterConfig) -> Result<Self, ConfigError> {
        for (id, dataset) in &config.datasets {
            select_origin(
                dataset.path.is_some(),
                dataset.url.is_some(),
                dataset.source.is_some(),
            )
            .map_err(|e| {
                warn!(dataset = %id, error = %e, "Invalid dataset configuration");
                e
            })?;
        }
        info!(
            datasets = config.datasets.len(),
            minzoom = config.minzoom,
            maxzoom = config.maxzoom,
            "Created tile cluster"
        );
        Ok(Self {
            config,
            store: DiskStore::new(),
            adapters: DashMap::new(),
        })
    }

    /// Number of dataset adapters instantiated so far.
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Serves a tile addressed as `{dataset}/{z}/{x}/{y}.{ext}`.
    ///
    /// The zoom gate and dataset lookup run before any adapter is
    /// constructed, so out-of-range or unknown requests are rejected
    /// cheaply.
    pub async fn serve_path(
        &self,
        path: &str,
        request: &RequestValidators,
        filter: Option<&TileFilter>,
    ) -> TileResponse {
        let Some((dataset_id, key)) = split_path(path) else {
            debug!(path, "Rejected unparseable cluster path");
            return not_found();
        };
        if key.zoom < self.config.minzoom || key.zoom > self.config.maxzoom {
            debug!(dataset = %dataset_id, tile = %key, "Zoom outside cluster window");
            return not_found();
        }
        let Some(dataset) = self.config.datasets.get(&dataset_id) else {
            debug!(dataset = %dataset_id, "Unknown dataset");
            return not_found();
        };

        let adapter = match self.adapter_for(&dataset_id, dataset) {
            Ok(adapter) => adapter,
            Err(e) => {
                warn!(dataset = %dataset_id, error = %e, "Failed to build dataset adapter");
                return TileResponse {
                    status: 502,
                    headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
                    body: Bytes::from_static(b"upstream failure"),
                };
            }
        };
        adapter.serve(key, request, filter).await
    }

    fn adapter_for(
        &self,
        id: &str,
        dataset: &BeardConfig,
    ) -> Result<Arc<TileBeard>, ConfigError> {
        if let Some(existing) = self.adapters.get(id) {
            return Ok(Arc::clone(&existing));
        }
        let adapter = Arc::new(TileBeard::build(
            dataset.clone(),
            None,
            self.store.clone(),
        )?);
        debug!(dataset = %id, "Instantiated dataset adapter");
        Ok(self
            .adapters
            .entry(id.to_string())
            .or_insert(adapter)
            .clone())
    }
}

fn not_found() -> TileResponse {
    TileResponse {
        status: 404,
        headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        body: Bytes::from_static(b"not found"),
    }
}

/// Splits a cluster path into the dataset id and the tile key. The last
/// three components are (z, x, y); what remains is the dataset id.
fn split_path(path: &str) -> Option<(String, TileKey)> {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    if components.len() < 4 {
        return None;
    }
    let (dataset, tail) = components.split_at(components.len() - 3);
    let key = TileKey::from_path(&tail.join("/"))?;
    Some((dataset.join("/"), key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_local(dir: &std::path::Path) -> ClusterBeard {
        let mut datasets = HashMap::new();
        datasets.insert(
            "osm".to_string(),
            BeardConfig::new().with_path(dir.to_path_buf()),
        );
        ClusterBeard::new(ClusterConfig {
            minzoom: 2,
            maxzoom: 10,
            datasets,
        })
        .unwrap()
    }

    #[test]
    fn test_split_path() {
        let (dataset, key) = split_path("osm/12/654/1583.png").unwrap();
        assert_eq!(dataset, "osm");
        assert_eq!(key, TileKey::new(12, 654, 1583));

        let (dataset, key) = split_path("layers/europe/osm/3/2/1").unwrap();
        assert_eq!(dataset, "layers/europe/osm");
        assert_eq!(key, TileKey::new(3, 2, 1));

        assert!(split_path("12/654/1583.png").is_none());
        assert!(split_path("osm/a/b/c.png").is_none());
    }

    #[test]
    fn test_new_validates_datasets_eagerly() {
        let mut datasets = HashMap::new();
        datasets.insert("empty".to_string(), BeardConfig::new());
        let result = ClusterBeard::new(ClusterConfig {
            minzoom: 0,
            maxzoom: 19,
            datasets,
        });
        assert!(matches!(result, Err(ConfigError::NoOrigin)));
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let config: ClusterConfig = serde_json::from_str(
            r#"{
                "minzoom": 3,
                "maxzoom": 15,
                "datasets": {
                    "osm": {"url": "http://tiles.example/osm"},
                    "ortho": {"path": "/srv/tiles/ortho", "compresslevel": 4}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.minzoom, 3);
        assert_eq!(config.maxzoom, 15);
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(
            config.datasets["osm"].url.as_deref(),
            Some("http://tiles.example/osm")
        );
    }

    #[tokio::test]
    async fn test_zoom_gate_rejects_before_adapter_construction() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = cluster_with_local(dir.path());

        let low = cluster
            .serve_path("osm/1/0/0.png", &RequestValidators::default(), None)
            .await;
        let high = cluster
            .serve_path("osm/11/0/0.png", &RequestValidators::default(), None)
            .await;
        assert_eq!(low.status, 404);
        assert_eq!(high.status, 404);
        assert_eq!(cluster.adapter_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = cluster_with_local(dir.path());
        let response = cluster
            .serve_path("nope/5/1/1.png", &RequestValidators::default(), None)
            .await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_routes_to_dataset_and_memoizes_adapter() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("5/1")).unwrap();
        std::fs::write(dir.path().join("5/1/1.png"), b"osm-tile").unwrap();

        let cluster = cluster_with_local(dir.path());
        let response = cluster
            .serve_path("osm/5/1/1.png", &RequestValidators::default(), None)
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from_static(b"osm-tile"));
        assert_eq!(cluster.adapter_count(), 1);

        let _ = cluster
            .serve_path("osm/5/1/2.png", &RequestValidators::default(), None)
            .await;
        assert_eq!(cluster.adapter_count(), 1);
    }
}
