//! Serving of stored floorplan images.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Serve a stored image with a content type guessed from its extension.
///
/// GET /media/*path
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.storage.read(&path).await?;
    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    Ok(([(header::CONTENT_TYPE, content_type)], data))
}
