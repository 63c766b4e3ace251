//! HTTP client abstraction for the proxy origin.
//!
//! The trait allows dependency injection and mock clients in tests. The
//! boxed-future form keeps it dyn-compatible so adapters can hold an
//! `Arc<dyn AsyncHttpClient>`.

use bytes::Bytes;
use thiserror::Error;

use crate::BoxFuture;

/// Errors from a remote tile fetch.
///
/// A remote 404 is a distinct, recoverable outcome ("confirmed absent");
/// everything else means the origin could not be consulted.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The remote origin answered 404 for this tile.
    #[error("remote origin returned 404")]
    NotFound,

    /// Network failure or a non-404 error status.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Trait for async HTTP GET operations.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchError>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with a 30 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(30)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchError>> {
        let request = self.client.get(url);
        let url = url.to_string();
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::Http(format!("request failed: {e}")))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound);
            }
            if !response.status().is_success() {
                return Err(FetchError::Http(format!(
                    "HTTP {} from {}",
                    response.status(),
                    url
                )));
            }

            response
                .bytes()
                .await
                .map_err(|e| FetchError::Http(format!("failed to read response: {e}")))
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock HTTP client for testing. Counts calls so tests can assert
    /// single-flight and cache-warm behavior.
    pub struct MockHttpClient {
        pub response: Result<Bytes, FetchError>,
        pub calls: AtomicUsize,
    }

    impl MockHttpClient {
        pub fn ok(body: &[u8]) -> Self {
            Self {
                response: Ok(Bytes::copy_from_slice(body)),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn not_found() -> Self {
            Self {
                response: Err(FetchError::NotFound),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                response: Err(FetchError::Http(message.to_string())),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        fn get(&self, _url: &str) -> BoxFuture<'_, Result<Bytes, FetchError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockHttpClient::ok(&[1, 2, 3, 4]);
        let result = mock.get("http://example.com/1/2/3.png").await;
        assert_eq!(result.unwrap(), Bytes::from_static(&[1, 2, 3, 4]));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_client_not_found() {
        let mock = MockHttpClient::not_found();
        let result = mock.get("http://example.com/1/2/3.png").await;
        assert!(matches!(result, Err(FetchError::NotFound)));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new().is_ok());
        assert!(ReqwestClient::with_timeout(5).is_ok());
    }
}
