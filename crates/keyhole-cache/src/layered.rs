use async_trait::async_trait;
use keyhole_core::cache::Result;
use keyhole_core::{CacheKey, UrlCache, UrlMapping};
use tracing::{debug, trace, warn};

/// A multi-layer cache that composes two cache implementations.
///
/// L1 is typically a fast, local cache (e.g. Moka) and L2 a slower, shared
/// cache (e.g. Redis).
///
/// - **Get**: try L1, then L2. An L2 hit is written back into L1.
/// - **Set**: write L2, then L1.
///
/// A failing layer is logged and skipped, so an L2 outage leaves L1 serving.
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
}

impl<L1, L2> LayeredCache<L1, L2> {
    /// Creates a new layered cache with the given L1 and L2 caches.
    pub fn new(l1: L1, l2: L2) -> Self {
        Self { l1, l2 }
    }

    /// Returns a reference to the L1 cache.
    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    /// Returns a reference to the L2 cache.
    pub fn l2(&self) -> &L2 {
        &self.l2
    }

    /// Consumes the layered cache and returns the inner caches.
    pub fn into_inner(self) -> (L1, L2) {
        (self.l1, self.l2)
    }
}

#[async_trait]
impl<L1, L2> UrlCache for LayeredCache<L1, L2>
where
    L1: UrlCache,
    L2: UrlCache,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<UrlMapping>> {
        let l1_healthy = match self.l1.get(key).await {
            Ok(Some(mapping)) => {
                debug!(key = %key, "L1 cache hit");
                return Ok(Some(mapping));
            }
            Ok(None) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "L1 cache read failed, trying L2");
                false
            }
        };
        trace!(key = %key, "L1 cache miss, trying L2");

        match self.l2.get(key).await {
            Ok(Some(mapping)) => {
                debug!(key = %key, "L2 cache hit, backfilling L1");
                if let Err(e) = self.l1.set(key, &mapping).await {
                    warn!(key = %key, error = %e, "L1 backfill failed");
                }
                Ok(Some(mapping))
            }
            Ok(None) => {
                trace!(key = %key, "L2 cache miss");
                Ok(None)
            }
            // An L2 outage is a miss as long as L1 answered.
            Err(e) if l1_healthy => {
                warn!(key = %key, error = %e, "L2 cache read failed, treating as miss");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes both layers. Fails only when neither layer took the write.
    async fn set(&self, key: &CacheKey, mapping: &UrlMapping) -> Result<()> {
        let l2 = self.l2.set(key, mapping).await;
        let l1 = self.l1.set(key, mapping).await;

        match (l1, l2) {
            (Ok(()), Ok(())) => {
                trace!(key = %key, "Stored mapping in both layers");
                Ok(())
            }
            (Ok(()), Err(e)) => {
                warn!(key = %key, error = %e, "L2 cache write failed, kept in L1");
                Ok(())
            }
            (Err(e), Ok(())) => {
                warn!(key = %key, error = %e, "L1 cache write failed, kept in L2");
                Ok(())
            }
            (Err(_), Err(e)) => Err(e),
        }
    }
}
