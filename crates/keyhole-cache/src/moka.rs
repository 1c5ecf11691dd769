use async_trait::async_trait;
use keyhole_core::cache::Result;
use keyhole_core::{CacheKey, UrlCache, UrlMapping};
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_CAPACITY: u64 = 10_000;

/// An in-memory cache implementation using Moka.
///
/// This implementation stores URL mappings in a concurrent, high-performance
/// in-memory cache. It's ideal for single-node deployments or as a L1 cache
/// in front of Redis.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<String, UrlMapping>,
}

impl MokaUrlCache {
    /// Creates a new Moka URL cache holding up to 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a new Moka URL cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<UrlMapping>> {
        let key = key.render();
        trace!(key = %key, "Fetching mapping from Moka cache");

        match self.cache.get(&key).await {
            Some(mapping) => {
                debug!(key = %key, "Cache hit in Moka");
                Ok(Some(mapping))
            }
            None => {
                trace!(key = %key, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, mapping: &UrlMapping) -> Result<()> {
        let key = key.render();
        trace!(key = %key, "Storing mapping in Moka cache");

        self.cache.insert(key, mapping.clone()).await;
        Ok(())
    }
}

/// Configuration for creating a MokaUrlCache with custom settings.
#[derive(Debug, TypedBuilder, Default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default, setter(strip_option))]
    pub max_capacity: Option<u64>,
    /// Time-to-live for cache entries.
    #[builder(default, setter(strip_option))]
    pub ttl: Option<Duration>,
    /// Time-to-idle for cache entries.
    #[builder(default, setter(strip_option))]
    pub tti: Option<Duration>,
}

impl From<CacheConfig> for MokaUrlCache {
    fn from(config: CacheConfig) -> Self {
        let mut builder = Cache::builder();

        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        MokaUrlCache {
            cache: builder.build(),
        }
    }
}
