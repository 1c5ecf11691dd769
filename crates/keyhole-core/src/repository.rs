use crate::error::StorageError;
use crate::shortkey::ShortKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A persisted long URL to short key mapping.
///
/// Created once per distinct long URL and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapping {
    /// The original URL that was shortened.
    pub long_url: String,
    /// The key assigned to `long_url`.
    pub short_key: ShortKey,
    /// Optional display label, empty when not given.
    pub title: String,
}

/// A read-only view of the mapping store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Looks up the mapping for a long URL.
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlMapping>>;

    /// Looks up the mapping for a short key.
    async fn find_by_short_key(&self, key: &ShortKey) -> Result<Option<UrlMapping>>;

    /// Checks whether a short key is already taken.
    async fn exists(&self, key: &ShortKey) -> Result<bool>;

    /// Returns every mapping in insertion order.
    async fn list_all(&self) -> Result<Vec<UrlMapping>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new mapping.
    ///
    /// Returns `Err(DuplicateKey)` if the short key is taken and
    /// `Err(DuplicateLongUrl)` if the long URL is already mapped.
    async fn insert(&self, long_url: &str, key: &ShortKey, title: &str) -> Result<UrlMapping>;
}
