//! Disk store for cached tiles.
//!
//! Wraps blocking filesystem access in `spawn_blocking` behind a shared
//! [`IoLimiter`], so the async orchestration path never blocks its own
//! thread. Reads distinguish "missing" (a normal cache miss) from real I/O
//! failures; writes create parent directories on demand.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::ResolveError;
use crate::limiter::IoLimiter;

/// Disk accessor shared by the resolvers of one or more adapters.
#[derive(Clone)]
pub struct DiskStore {
    limiter: Arc<IoLimiter>,
}

impl DiskStore {
    /// Creates a store with its own limiter using default sizing.
    pub fn new() -> Self {
        Self {
            limiter: Arc::new(IoLimiter::with_defaults("tile_store")),
        }
    }

    /// Creates a store sharing an existing limiter, so multiple adapters
    /// coordinate their disk I/O globally.
    pub fn with_limiter(limiter: Arc<IoLimiter>) -> Self {
        Self { limiter }
    }

    /// Reads a cached tile.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` on a hit
    /// - `Ok(None)` when the file does not exist (cache miss)
    /// - `Err(_)` for any other I/O failure
    pub async fn read(&self, path: &Path) -> Result<Option<Bytes>, ResolveError> {
        let path = path.to_path_buf();
        let _permit = self.limiter.acquire().await;
        let result = tokio::task::spawn_blocking(move || std::fs::read(&path))
            .await
            .map_err(|e| ResolveError::Upstream(format!("read task failed: {e}")))?;
        match result {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ResolveError::Io(e)),
        }
    }

    /// Writes a tile, creating parent directories as needed.
    ///
    /// Writes to a cache path are idempotent (same key, same bytes), so a
    /// rare duplicate write is safe.
    pub async fn write(&self, path: &Path, data: Bytes) -> io::Result<()> {
        let path = path.to_path_buf();
        let _permit = self.limiter.acquire().await;
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &data)
        })
        .await
        .map_err(|e| io::Error::other(e.to_string()))?
    }

    /// Returns the file's modification time, or `None` when the file is
    /// missing or unreadable.
    pub async fn mtime(&self, path: &Path) -> Option<SystemTime> {
        let path = path.to_path_buf();
        let _permit = self.limiter.acquire().await;
        tokio::task::spawn_blocking(move || {
            std::fs::metadata(&path).and_then(|m| m.modified()).ok()
        })
        .await
        .ok()
        .flatten()
    }
}

impl Default for DiskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from clearing a cache directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearResult {
    /// Number of files deleted.
    pub files_deleted: u64,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

/// Walks a cache directory and returns `(file_count, total_bytes)`.
pub fn disk_cache_stats(dir: &Path) -> io::Result<(u64, u64)> {
    let mut files = 0;
    let mut bytes = 0;
    visit_files(dir, &mut |metadata| {
        files += 1;
        bytes += metadata.len();
        Ok(())
    })?;
    Ok((files, bytes))
}

/// Deletes every file under a cache directory, leaving the directory
/// structure in place.
pub fn clear_disk_cache(dir: &Path) -> io::Result<ClearResult> {
    let mut result = ClearResult::default();
    let mut paths = Vec::new();
    collect_files(dir, &mut paths)?;
    for path in paths {
        let len = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        std::fs::remove_file(&path)?;
        result.files_deleted += 1;
        result.bytes_freed += len;
    }
    Ok(result)
}

fn visit_files(
    dir: &Path,
    visit: &mut dyn FnMut(std::fs::Metadata) -> io::Result<()>,
) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            visit_files(&entry.path(), visit)?;
        } else if file_type.is_file() {
            visit(entry.metadata()?)?;
        }
    }
    Ok(())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), out)?;
        } else if file_type.is_file() {
            out.push(entry.path());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new();
        let result = store.read(&dir.path().join("12/3/4.png")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_write_creates_parents_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new();
        let path = dir.path().join("12/654/1583.png");

        store
            .write(&path, Bytes::from_static(b"tile-bytes"))
            .await
            .unwrap();

        assert!(path.exists());
        let read = store.read(&path).await.unwrap();
        assert_eq!(read, Some(Bytes::from_static(b"tile-bytes")));
    }

    #[tokio::test]
    async fn test_mtime_of_missing_file() {
        let store = DiskStore::new();
        assert!(store.mtime(Path::new("/no/such/file.png")).await.is_none());
    }

    #[tokio::test]
    async fn test_mtime_present_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new();
        let path = dir.path().join("1/2/3.png");
        store.write(&path, Bytes::from_static(b"x")).await.unwrap();
        assert!(store.mtime(&path).await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_limiter() {
        let dir = tempfile::tempdir().unwrap();
        let limiter = Arc::new(IoLimiter::new(4, "shared_test"));
        let store = DiskStore::with_limiter(Arc::clone(&limiter));

        for i in 0..16u32 {
            store
                .write(&dir.path().join(format!("z/{i}.png")), Bytes::from(vec![i as u8]))
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..16u32 {
            let store = store.clone();
            let path = dir.path().join(format!("z/{i}.png"));
            handles.push(tokio::spawn(async move { store.read(&path).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }
        assert!(limiter.peak_in_flight() <= 4);
    }

    #[test]
    fn test_stats_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("12/654")).unwrap();
        std::fs::write(dir.path().join("12/654/1583.png"), [0u8; 100]).unwrap();
        std::fs::write(dir.path().join("12/654/1584.png"), [0u8; 50]).unwrap();

        let (files, bytes) = disk_cache_stats(dir.path()).unwrap();
        assert_eq!(files, 2);
        assert_eq!(bytes, 150);

        let cleared = clear_disk_cache(dir.path()).unwrap();
        assert_eq!(cleared.files_deleted, 2);
        assert_eq!(cleared.bytes_freed, 150);

        let (files, _) = disk_cache_stats(dir.path()).unwrap();
        assert_eq!(files, 0);
    }

    #[test]
    fn test_stats_of_missing_dir() {
        let (files, bytes) = disk_cache_stats(Path::new("/no/such/dir")).unwrap();
        assert_eq!((files, bytes), (0, 0));
    }
}
