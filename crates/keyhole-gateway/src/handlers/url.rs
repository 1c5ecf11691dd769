use crate::error::Result;
use crate::model::{EncodeUrlRequest, EncodeUrlResponse, UrlEntry};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Json;
use keyhole_core::{EncodeParams, ShortKey};
use tracing::debug;

pub async fn encode_url_handler(
    State(state): State<AppState>,
    Json(request): Json<EncodeUrlRequest>,
) -> Result<Json<EncodeUrlResponse>> {
    let params = EncodeParams::new(request.long_url).with_title(request.title);
    let encoded = state.shortener().encode(params).await?;
    Ok(Json(encoded.into()))
}

pub async fn list_urls_handler(State(state): State<AppState>) -> Result<Json<Vec<UrlEntry>>> {
    let mappings = state.shortener().list_all().await?;
    Ok(Json(mappings.into_iter().map(UrlEntry::from).collect()))
}

pub async fn redirect_handler(
    Path(short_key): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let key = ShortKey::parse(&short_key)?;
    let long_url = state.shortener().resolve(&key).await?;
    debug!(short_key = %key, long_url = %long_url, "Redirecting");
    Ok(Redirect::temporary(&long_url))
}
