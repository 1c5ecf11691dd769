use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyhole_core::ShortenerError;
use serde_json::json;
use tracing::{debug, error};

pub type Result<T> = std::result::Result<T, AppError>;

/// A shortener error on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct AppError(ShortenerError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            // A malformed key cannot name a stored mapping.
            ShortenerError::NotFound(_) | ShortenerError::InvalidShortKey(_) => {
                StatusCode::NOT_FOUND
            }
            ShortenerError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            err if err.is_retriable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
