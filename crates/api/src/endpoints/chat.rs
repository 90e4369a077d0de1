//! Chat proxy endpoint.

use axum::{Json, Router, extract::State, routing::post};
use chainfeed_common::AppResult;
use chainfeed_core::ChatInput;
use serde_json::Value;

use crate::{extractors::ApiJson, middleware::AppState};

/// Forward a chat turn to the avatar-video service.
async fn chat(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ChatInput>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.chat_service.chat(input).await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}
