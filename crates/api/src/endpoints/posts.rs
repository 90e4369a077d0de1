//! Post endpoints, including likes, collects and comments.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chainfeed_common::AppResult;
use chainfeed_core::{CommentView, CreateCommentInput, CreatePostInput, FeedPost};
use chainfeed_db::entities::{post_collect, post_like};
use serde::Deserialize;

use crate::{
    extractors::{ApiJson, ApiQuery, required},
    middleware::AppState,
    response::Success,
};

/// Query naming the viewer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerQuery {
    pub user_address: Option<String>,
}

/// Like or collect request.
#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub user_address: Option<String>,
    pub transaction_hash: Option<String>,
}

/// Home feed for the viewer.
async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ViewerQuery>,
) -> AppResult<Json<Vec<FeedPost>>> {
    let posts = state
        .post_service
        .home_feed(query.user_address.as_deref())
        .await?;
    Ok(Json(posts))
}

/// Create a post.
async fn create_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreatePostInput>,
) -> AppResult<Json<FeedPost>> {
    Ok(Json(state.post_service.create(input).await?))
}

/// Show one post.
async fn show_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<ViewerQuery>,
) -> AppResult<Json<FeedPost>> {
    let post = state
        .post_service
        .get(&id, query.user_address.as_deref())
        .await?;
    Ok(Json(post))
}

/// Like a post.
async fn like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<InteractionRequest>,
) -> AppResult<Json<post_like::Model>> {
    let user = required(req.user_address, "User address is required")?;
    let like = state
        .interaction_service
        .like(&id, &user, req.transaction_hash)
        .await?;
    Ok(Json(like))
}

/// Remove a like.
async fn unlike(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<InteractionRequest>,
) -> AppResult<Success> {
    let user = required(req.user_address, "User address is required")?;
    state.interaction_service.unlike(&id, &user).await?;
    Ok(Success::ack())
}

/// Collect a post.
async fn collect(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<InteractionRequest>,
) -> AppResult<Json<post_collect::Model>> {
    let user = required(req.user_address, "User address is required")?;
    let collect = state
        .interaction_service
        .collect(&id, &user, req.transaction_hash)
        .await?;
    Ok(Json(collect))
}

/// Remove a collect.
async fn uncollect(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<InteractionRequest>,
) -> AppResult<Success> {
    let user = required(req.user_address, "User address is required")?;
    state.interaction_service.uncollect(&id, &user).await?;
    Ok(Success::ack())
}

/// Comments on a post, newest first.
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(state.interaction_service.list_comments(&id).await?))
}

/// Comment on a post.
async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CreateCommentInput>,
) -> AppResult<Json<CommentView>> {
    Ok(Json(state.interaction_service.comment(&id, input).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(show_post))
        .route("/{id}/like", post(like).delete(unlike))
        .route("/{id}/collect", post(collect).delete(uncollect))
        .route("/{id}/comments", get(list_comments).post(create_comment))
}
