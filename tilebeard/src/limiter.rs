//! Disk I/O concurrency limiter.
//!
//! All blocking file operations funnel through `spawn_blocking`; without a
//! gate, a burst of cold tiles can overwhelm the filesystem with concurrent
//! reads and writes. The limiter bounds in-flight disk operations with a
//! semaphore, shareable across adapters so a cluster coordinates its disk
//! I/O globally.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of concurrent disk operations.
#[derive(Debug)]
pub struct IoLimiter {
    semaphore: Arc<Semaphore>,
    permits: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    label: String,
}

impl IoLimiter {
    /// Creates a limiter with an explicit permit count.
    ///
    /// # Arguments
    ///
    /// * `permits` - Maximum concurrent disk operations
    /// * `label` - Human-readable label for logging
    pub fn new(permits: usize, label: impl Into<String>) -> Self {
        assert!(permits > 0, "permits must be > 0");
        let label = label.into();
        tracing::debug!(permits, label = %label, "Created disk I/O limiter");
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            label,
        }
    }

    /// Creates a limiter with disk-oriented defaults: `min(cpus * 4, 64)`.
    /// Disk I/O is queue-depth limited, so this is deliberately more
    /// conservative than network concurrency.
    pub fn with_defaults(label: impl Into<String>) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self::new((cpus * 4).min(64), label)
    }

    /// Acquires a permit, waiting if the limiter is saturated.
    pub async fn acquire(&self) -> IoPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("I/O limiter semaphore closed");
        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::Relaxed);
        IoPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Total configured permits.
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// Operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// High-water mark of concurrent operations.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// The limiter's label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// RAII permit from the limiter; released on drop.
pub struct IoPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for IoPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let limiter = IoLimiter::new(2, "test");
        let a = limiter.acquire().await;
        let b = limiter.acquire().await;
        assert_eq!(limiter.in_flight(), 2);
        drop(a);
        drop(b);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_saturated_limiter_blocks() {
        let limiter = Arc::new(IoLimiter::new(1, "test"));
        let held = limiter.acquire().await;

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                let _p = limiter.acquire().await;
            })
        };

        // The waiter cannot finish while the permit is held
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap();
    }

    #[test]
    fn test_defaults_are_bounded() {
        let limiter = IoLimiter::with_defaults("test");
        assert!(limiter.permits() >= 1);
        assert!(limiter.permits() <= 64);
    }

    #[test]
    #[should_panic(expected = "permits must be > 0")]
    fn test_zero_permits_panics() {
        let _ = IoLimiter::new(0, "test");
    }
}
