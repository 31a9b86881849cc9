use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::storage::{FsImageStore, ImageStore};

/// GET /api/images/:filename - Serve a cached image. The filename is
/// validated as a single plain path component before it touches the
/// filesystem.
pub async fn get(Path(filename): Path<String>) -> Result<Response, ApiError> {
    let store = FsImageStore::from_config();
    let (bytes, content_type) = store.open(&filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            // Content-addressed names never change meaning, so cache hard
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        bytes,
    )
        .into_response())
}
