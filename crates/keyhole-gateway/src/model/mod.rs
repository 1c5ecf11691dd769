mod url;

use serde::{Deserialize, Serialize};

pub use url::{EncodeUrlRequest, EncodeUrlResponse, UrlEntry};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
