use crate::error::CacheError;
use crate::repository::UrlMapping;
use crate::shortkey::ShortKey;
use async_trait::async_trait;
use std::fmt::Display;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A key in one of the two cache namespaces.
///
/// Long URL lookups live under `url:<long_url>` and short key lookups under
/// `short:<short_key>`. The tags differ, so the families never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    LongUrl(String),
    ShortKey(ShortKey),
}

impl CacheKey {
    pub fn long_url(long_url: impl Into<String>) -> Self {
        Self::LongUrl(long_url.into())
    }

    pub fn short_key(key: &ShortKey) -> Self {
        Self::ShortKey(key.clone())
    }

    /// Renders the namespaced key string used by cache backends.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::LongUrl(url) => write!(f, "url:{url}"),
            CacheKey::ShortKey(key) => write!(f, "short:{key}"),
        }
    }
}

/// A read-through cache for URL mappings.
///
/// Entries are an accelerator only; the store stays the source of truth.
/// Eviction and expiry belong to the backend.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get a mapping from the cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get(&self, key: &CacheKey) -> Result<Option<UrlMapping>>;

    /// Store a mapping in the cache.
    async fn set(&self, key: &CacheKey, mapping: &UrlMapping) -> Result<()>;
}
