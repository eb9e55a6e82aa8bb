//! Single-entry blob cache in local file storage
//!
//! The cache holds at most one blob under a fixed entry name. A load that
//! misses fetches over the network and overwrites the entry wholesale.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use explorer_types::CacheSource;
use log::{info, warn};

/// Origin-scoped file storage (OPFS in the browser)
pub trait FileStorage {
    /// Whether the host can write files; reads alone are useless for caching
    fn supports_write(&self) -> bool;

    /// Contents of `name`, or `None` if there is no such entry
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite `name`
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    async fn remove(&self, name: &str) -> Result<()>;
}

/// Fetches a byte buffer over the network
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Caches one downloaded source blob under `entry`
pub struct BlobCache<S, F> {
    storage: S,
    fetcher: F,
    entry: String,
}

impl<S: FileStorage, F: Fetcher> BlobCache<S, F> {
    pub fn new(storage: S, fetcher: F, entry: impl Into<String>) -> Self {
        Self {
            storage,
            fetcher,
            entry: entry.into(),
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Returns the cached blob, or fetches `url` and caches the result.
    ///
    /// Write-back failures are logged and the fetched buffer is returned
    /// anyway. Network failures propagate.
    pub async fn load(&self, url: &str) -> Result<Vec<u8>> {
        self.load_with_source(url).await.map(|(bytes, _)| bytes)
    }

    /// Like [`BlobCache::load`], also reporting where the bytes came from
    pub async fn load_with_source(&self, url: &str) -> Result<(Vec<u8>, CacheSource)> {
        if !self.storage.supports_write() {
            info!("file storage is not writable, fetching {} without caching", url);
            let bytes = self.fetcher.fetch(url).await?;
            return Ok((bytes, CacheSource::NetworkUncached));
        }

        match self.storage.read(&self.entry).await {
            Ok(Some(bytes)) => {
                info!("loaded {} ({} bytes) from cache", self.entry, bytes.len());
                return Ok((bytes, CacheSource::Cache));
            }
            Ok(None) => {}
            Err(err) => warn!("cache entry {} is unreadable: {}", self.entry, err),
        }

        let bytes = self.fetcher.fetch(url).await?;
        info!("fetched {} ({} bytes)", url, bytes.len());
        match self.storage.write(&self.entry, &bytes).await {
            Ok(()) => Ok((bytes, CacheSource::Network)),
            Err(err) => {
                warn!("failed to cache {}: {}", self.entry, err);
                Ok((bytes, CacheSource::NetworkUncached))
            }
        }
    }

    /// Removes the cached entry; failures propagate
    pub async fn evict(&self) -> Result<()> {
        self.storage.remove(&self.entry).await?;
        info!("evicted {}", self.entry);
        Ok(())
    }
}
