//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chainfeed_common::AppResult;
use chainfeed_db::entities::user;
use serde::{Deserialize, Serialize};

use crate::{extractors::ApiJson, middleware::AppState};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub wallet_address: String,
}

/// Login response.
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: user::Model,
    pub message: &'static str,
}

/// Log in with a wallet address. First login creates the user.
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = state.user_service.login(&req.wallet_address).await?;

    Ok(Json(LoginResponse {
        user,
        message: "Login successful",
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
