//! Direct message endpoint.

use axum::{Router, extract::State, routing::post};
use chainfeed_common::AppResult;
use chainfeed_core::{NotificationView, SendMessageInput};

use crate::{extractors::ApiJson, middleware::AppState, response::Success};

/// Send a message. `data` is the recipient's notification, or `null` when
/// messaging oneself.
async fn send(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SendMessageInput>,
) -> AppResult<Success<Option<NotificationView>>> {
    let notification = state.messaging_service.send(input).await?;
    Ok(Success::with(notification))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(send))
}
