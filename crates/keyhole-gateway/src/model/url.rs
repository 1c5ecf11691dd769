use keyhole_core::{Encoded, UrlMapping};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeUrlRequest {
    pub long_url: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeUrlResponse {
    pub short_key: String,
    pub real_url: String,
    pub display_url: String,
    pub title: String,
}

impl From<Encoded> for EncodeUrlResponse {
    fn from(value: Encoded) -> Self {
        Self {
            short_key: value.short_key.to_string(),
            real_url: value.real_url,
            display_url: value.display_url,
            title: value.title,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlEntry {
    pub short_key: String,
    pub long_url: String,
    pub title: String,
}

impl From<UrlMapping> for UrlEntry {
    fn from(value: UrlMapping) -> Self {
        Self {
            short_key: value.short_key.to_string(),
            long_url: value.long_url,
            title: value.title,
        }
    }
}
