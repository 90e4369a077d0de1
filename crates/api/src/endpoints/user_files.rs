//! Knowledge-base file endpoints.

use axum::{Json, Router, extract::State, routing::get};
use chainfeed_common::AppResult;
use chainfeed_core::CreateUserFileInput;
use chainfeed_db::entities::user_file;
use serde::Deserialize;

use crate::{
    extractors::{ApiJson, ApiQuery, required},
    middleware::AppState,
    response::Success,
};

/// List query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    pub user_address: Option<String>,
}

/// Delete query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileQuery {
    pub file_id: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListFilesQuery>,
) -> AppResult<Json<Vec<user_file::Model>>> {
    let user = required(query.user_address, "User address is required")?;
    Ok(Json(state.user_file_service.list(&user).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateUserFileInput>,
) -> AppResult<Json<user_file::Model>> {
    Ok(Json(state.user_file_service.create(input).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeleteFileQuery>,
) -> AppResult<Success> {
    let id = required(query.file_id, "File ID is required")?;
    state.user_file_service.delete(&id).await?;
    Ok(Success::ack())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create).delete(delete))
}
