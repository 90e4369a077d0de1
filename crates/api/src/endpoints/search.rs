//! Search endpoint.

use axum::{Json, Router, extract::State, routing::get};
use chainfeed_common::AppResult;
use chainfeed_core::{SearchResults, SearchType};
use serde::Deserialize;

use crate::{extractors::ApiQuery, middleware::AppState};

/// Search query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub search_type: SearchType,
    pub requesting_user_address: Option<String>,
}

/// Search users and posts. An empty query matches everything.
async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<SearchResults>> {
    let results = state
        .search_service
        .search(
            &query.q,
            query.search_type,
            query.requesting_user_address.as_deref(),
        )
        .await?;
    Ok(Json(results))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search))
}
