//! Caching layer for the rail overlay.
//!
//! The overlay is permanent infrastructure and changes far less often than
//! the feed, so the downloaded KMZ is kept for a while. Entries are keyed by
//! the token that fetched them; a token that cannot read the repository
//! never sees bytes fetched with one that can.

use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::fetch::{FetchError, OverlayClient};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl CacheConfig {
    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of cached entries.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 16,
        }
    }
}

/// Overlay bytes keyed by token.
pub struct OverlayCache {
    entries: MokaCache<String, Bytes>,
}

impl OverlayCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { entries }
    }

    pub async fn get(&self, token: &str) -> Option<Bytes> {
        self.entries.get(token).await
    }

    pub async fn insert(&self, token: &str, overlay: Bytes) {
        self.entries.insert(token.to_string(), overlay).await;
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

/// Overlay client with caching.
pub struct CachedOverlayClient {
    client: OverlayClient,
    cache: OverlayCache,
}

impl CachedOverlayClient {
    /// Create a new cached client.
    pub fn new(client: OverlayClient, cache_config: &CacheConfig) -> Self {
        Self {
            client,
            cache: OverlayCache::new(cache_config),
        }
    }

    /// Get the overlay, using the cache if available.
    pub async fn fetch(&self, token: &str) -> Result<Bytes, FetchError> {
        if let Some(cached) = self.cache.get(token).await {
            debug!(
                bytes = cached.len(),
                entries = self.cache.entry_count(),
                "rail overlay served from cache"
            );
            return Ok(cached);
        }

        let overlay = self.client.fetch(token).await?;
        self.cache.insert(token, overlay.clone()).await;

        Ok(overlay)
    }
}
