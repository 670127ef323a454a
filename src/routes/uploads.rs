use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
    routing::get,
};
use tokio_util::io::ReaderStream;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{filename}", get(serve_upload))
}

/// Stream a committed upload. Filenames are opaque UUID-based names, so
/// anything else simply resolves to a missing file.
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<(HeaderMap, Body)> {
    let path = state.uploads.resolve(&filename)?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| AppError::NotFound)?;

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    Ok((headers, body))
}
