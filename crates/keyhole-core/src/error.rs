use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The short key is already taken by another mapping.
    #[error("short key already exists: {0}")]
    DuplicateKey(String),
    /// A mapping for the long URL already exists.
    #[error("long url already mapped: {0}")]
    DuplicateLongUrl(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Returns `true` for the uniqueness violations raised by a racing insert.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::DuplicateKey(_) | StorageError::DuplicateLongUrl(_)
        )
    }
}

/// Errors surfaced by the shortening coordinator to the request layer.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("short key not found: {0}")]
    NotFound(String),
    #[error("no free short key after {attempts} attempts")]
    ExhaustedKeySpace { attempts: u32 },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid short key: {0}")]
    InvalidShortKey(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ShortenerError {
    /// Whether the caller may retry the request later.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ShortenerError::ExhaustedKeySpace { .. } | ShortenerError::StoreUnavailable(_)
        )
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        ShortenerError::StoreUnavailable(value.to_string())
    }
}
