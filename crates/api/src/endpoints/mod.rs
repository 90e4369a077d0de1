//! API endpoints.

mod auth;
mod chat;
mod health;
mod media;
mod messages;
mod notifications;
mod posts;
mod search;
mod user_files;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router. The server nests it under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/posts", posts::router())
        .nest("/search", search::router())
        .nest("/notifications", notifications::router())
        .nest("/messages", messages::router())
        .nest("/user-files", user_files::router())
        .nest("/upload", media::upload_router())
        .nest("/static", media::static_router())
        .nest("/chat", chat::router())
        .nest("/health", health::router())
}
