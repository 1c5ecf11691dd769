use crate::repository::UrlMapping;
use crate::shortkey::ShortKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for encoding a long URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodeParams {
    /// The URL to be shortened.
    pub long_url: String,
    /// Display label stored with a newly created mapping.
    #[serde(default)]
    pub title: String,
}

impl EncodeParams {
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// The result of an encode call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoded {
    pub short_key: ShortKey,
    /// The URL that actually serves the redirect.
    pub real_url: String,
    /// The URL shown to users.
    pub display_url: String,
    pub title: String,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the canonical short key for a long URL, creating it on first use.
    async fn encode(&self, params: EncodeParams) -> Result<Encoded>;

    /// Resolves a short key to its long URL.
    ///
    /// Fails with `NotFound` if the key was never assigned.
    async fn resolve(&self, key: &ShortKey) -> Result<String>;

    /// Returns every stored mapping in insertion order.
    async fn list_all(&self) -> Result<Vec<UrlMapping>>;
}
