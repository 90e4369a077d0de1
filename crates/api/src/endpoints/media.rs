//! Media upload and static file serving.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use chainfeed_common::{AppError, AppResult, content_type_for, upload_file_name};
use chrono::Utc;
use serde::Serialize;

use crate::middleware::AppState;

const CACHE_CONTROL: &str = "public, max-age=86400";

/// Upload response.
#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Store the multipart field `file` and return its public URL.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let key = upload_file_name(Utc::now().timestamp_millis(), &original_name);
        let stored = state.storage.upload(&key, &data).await?;

        tracing::info!(key = %stored.key, size = stored.size, "File uploaded");
        return Ok(Json(UploadResponse { url: stored.url }));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

/// Serve an uploaded file.
async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<impl IntoResponse> {
    let bytes = state
        .storage
        .read(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path)),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        bytes,
    ))
}

pub fn upload_router() -> Router<AppState> {
    Router::new().route("/", post(upload))
}

pub fn static_router() -> Router<AppState> {
    Router::new().route("/{*path}", get(serve))
}
