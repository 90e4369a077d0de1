//! User endpoints: profiles, follows, friends and per-user post listings.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chainfeed_common::AppResult;
use chainfeed_core::{FeedPost, ProfileView, UpsertProfileInput, UserWithCounts};
use chainfeed_db::entities::{follow, user};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{ApiJson, ApiQuery, required},
    middleware::AppState,
    response::Success,
};

/// Profile upsert request for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct UpsertUserRequest {
    #[serde(default)]
    pub wallet_address: String,
    #[serde(flatten)]
    pub profile: UpsertProfileInput,
}

/// Query naming the viewer of a profile.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    pub requesting_user_address: Option<String>,
}

/// Query or body naming the follower.
#[derive(Debug, Default, Deserialize)]
pub struct FollowerParams {
    pub follower_address: Option<String>,
}

/// Follow status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusResponse {
    pub is_following: bool,
}

/// Query or body naming the friend.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendParams {
    pub friend_address: Option<String>,
}

/// List all users with counts.
async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserWithCounts>>> {
    Ok(Json(state.user_service.list_with_counts().await?))
}

/// Create or update a user.
async fn upsert_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpsertUserRequest>,
) -> AppResult<Json<user::Model>> {
    let user = state
        .user_service
        .upsert_profile(&req.wallet_address, req.profile)
        .await?;
    Ok(Json(user))
}

/// Show a profile as seen by the requesting user.
async fn show_user(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiQuery(query): ApiQuery<ProfileQuery>,
) -> AppResult<Json<ProfileView>> {
    let profile = state
        .profile_service
        .resolve(query.requesting_user_address.as_deref(), &address)
        .await?;
    Ok(Json(profile))
}

/// Update a profile.
async fn update_user(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiJson(input): ApiJson<UpsertProfileInput>,
) -> AppResult<Json<user::Model>> {
    Ok(Json(state.user_service.upsert_profile(&address, input).await?))
}

/// Check whether `follower_address` follows this user.
async fn follow_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiQuery(params): ApiQuery<FollowerParams>,
) -> AppResult<Json<FollowStatusResponse>> {
    let follower = required(params.follower_address, "Follower address is required")?;
    let is_following = state
        .following_service
        .is_following(&follower, &address)
        .await?;
    Ok(Json(FollowStatusResponse { is_following }))
}

/// Follow this user.
async fn follow(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiJson(params): ApiJson<FollowerParams>,
) -> AppResult<Json<follow::Model>> {
    let follower = required(params.follower_address, "Follower address is required")?;
    Ok(Json(state.following_service.follow(&follower, &address).await?))
}

/// Unfollow this user.
async fn unfollow(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiQuery(params): ApiQuery<FollowerParams>,
) -> AppResult<Success> {
    let follower = required(params.follower_address, "Follower address is required")?;
    state.following_service.unfollow(&follower, &address).await?;
    Ok(Success::ack())
}

/// Users this user follows.
async fn following(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<Vec<UserWithCounts>>> {
    Ok(Json(state.following_service.list_following(&address).await?))
}

/// This user's friends.
async fn list_friends(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<Vec<UserWithCounts>>> {
    Ok(Json(state.friend_service.list_friends(&address).await?))
}

/// Add a friend.
async fn add_friend(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiJson(params): ApiJson<FriendParams>,
) -> AppResult<Success> {
    let friend = required(params.friend_address, "Friend address is required")?;
    state.friend_service.add_friend(&address, &friend).await?;
    Ok(Success::ack())
}

/// Remove a friend.
async fn remove_friend(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiQuery(params): ApiQuery<FriendParams>,
) -> AppResult<Success> {
    let friend = required(params.friend_address, "Friend address is required")?;
    state.friend_service.remove_friend(&address, &friend).await?;
    Ok(Success::ack())
}

/// Posts by this user's friends.
async fn friends_posts(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<Vec<FeedPost>>> {
    Ok(Json(state.post_service.friends_feed(&address).await?))
}

/// Posts this user liked.
async fn liked_posts(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<Vec<FeedPost>>> {
    Ok(Json(state.post_service.liked_posts(&address).await?))
}

/// Posts this user collected.
async fn collected_posts(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<Vec<FeedPost>>> {
    Ok(Json(state.post_service.collected_posts(&address).await?))
}

/// This user's own posts.
async fn my_posts(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<Vec<FeedPost>>> {
    Ok(Json(state.post_service.my_posts(&address).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(upsert_user))
        .route("/{address}", get(show_user).put(update_user))
        .route(
            "/{address}/follow",
            get(follow_status).post(follow).delete(unfollow),
        )
        .route("/{address}/following", get(following))
        .route(
            "/{address}/friends",
            get(list_friends).post(add_friend).delete(remove_friend),
        )
        .route("/{address}/friends-posts", get(friends_posts))
        .route("/{address}/liked-posts", get(liked_posts))
        .route("/{address}/collected-posts", get(collected_posts))
        .route("/{address}/my-posts", get(my_posts))
}
