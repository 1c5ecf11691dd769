use async_trait::async_trait;
use keyhole_core::cache::Result;
use keyhole_core::{CacheKey, UrlCache, UrlMapping};

/// A cache that stores nothing.
///
/// Used when caching is disabled; every lookup goes to the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl UrlCache for NoopCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<UrlMapping>> {
        Ok(None)
    }

    async fn set(&self, _key: &CacheKey, _mapping: &UrlMapping) -> Result<()> {
        Ok(())
    }
}
