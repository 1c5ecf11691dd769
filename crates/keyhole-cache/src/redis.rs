use async_trait::async_trait;
use keyhole_core::cache::Result;
use keyhole_core::{CacheError, CacheKey, UrlCache, UrlMapping};
use redis::AsyncCommands;
use tracing::{debug, trace, warn};

/// A Redis-based implementation of [`UrlCache`].
///
/// Mappings are stored as JSON strings under the namespaced cache key,
/// optionally behind a deployment-wide prefix.
#[derive(Debug, Clone)]
pub struct RedisUrlCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisUrlCache {
    /// Creates a new Redis URL cache that writes keys as `url:...` / `short:...`.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, "")
    }

    /// Creates a new Redis URL cache with a prefix in front of every key
    /// (e.g. `"keyhole:"` gives `keyhole:url:...`).
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client =
            redis::Client::open(redis_url).map_err(|e| map_redis_error("invalid url", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::with_prefix(conn, key_prefix))
    }

    fn redis_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<UrlMapping>> {
        let redis_key = self.redis_key(key);
        trace!(key = %redis_key, "Fetching mapping from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(cached)) => {
                debug!(key = %redis_key, "Cache hit in Redis");
                match serde_json::from_str::<UrlMapping>(&cached) {
                    Ok(mapping) => Ok(Some(mapping)),
                    Err(e) => {
                        warn!(key = %redis_key, error = %e, "Failed to deserialize cached mapping");
                        Err(CacheError::InvalidData(format!(
                            "invalid cached value for key '{redis_key}': {e}"
                        )))
                    }
                }
            }
            Ok(None) => {
                trace!(key = %redis_key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %redis_key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set(&self, key: &CacheKey, mapping: &UrlMapping) -> Result<()> {
        let redis_key = self.redis_key(key);
        trace!(key = %redis_key, "Storing mapping in Redis cache");

        let json = serde_json::to_string(mapping).map_err(|e| {
            CacheError::Serialization(format!("failed to serialize cache value: {e}"))
        })?;

        let mut conn = self.conn.clone();
        match conn.set::<_, _, ()>(&redis_key, json).await {
            Ok(()) => {
                debug!(key = %redis_key, "Cached mapping in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(key = %redis_key, error = %e, "Failed to cache mapping in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }
}
