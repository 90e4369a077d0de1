//! Notifications endpoints.

use axum::{Json, Router, extract::State, routing::get};
use chainfeed_common::{AppError, AppResult};
use chainfeed_core::{NotificationView, PendingNotification, notification::DEFAULT_PAGE_SIZE};
use chainfeed_db::entities::notification::NotificationType;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{ApiJson, ApiQuery, required},
    middleware::AppState,
    response::{ApiResponse, Success},
};

/// List notifications query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    pub recipient_address: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    /// Include notifications already read.
    #[serde(default)]
    pub include_read: bool,
}

const fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Pagination metadata.
#[derive(Serialize)]
pub struct Pagination {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Notifications page response.
#[derive(Serialize)]
pub struct NotificationsListResponse {
    pub data: Vec<NotificationView>,
    pub pagination: Pagination,
}

/// Create notification request.
#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_address: Option<String>,
    pub sender_address: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub text: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
}

/// Mark read request.
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub id: Option<String>,
    pub is_read: Option<bool>,
}

/// Delete query: one notification by id, or all of a recipient's.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNotificationsQuery {
    pub id: Option<String>,
    pub recipient_address: Option<String>,
}

/// List a recipient's notifications, newest first.
async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListNotificationsQuery>,
) -> AppResult<Json<NotificationsListResponse>> {
    let recipient = required(query.recipient_address, "Recipient address is required")?;

    let page = state
        .notification_service
        .list(&recipient, query.limit, query.offset, query.include_read)
        .await?;

    Ok(Json(NotificationsListResponse {
        data: page.data,
        pagination: Pagination {
            total: page.total,
            offset: query.offset,
            limit: query.limit,
        },
    }))
}

/// Create a notification directly. `data` is `null` for a self-notification.
async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateNotificationRequest>,
) -> AppResult<ApiResponse<Option<NotificationView>>> {
    let recipient_address = required(req.recipient_address, "Recipient address is required")?;

    let pending = PendingNotification {
        recipient_address,
        sender_address: req.sender_address.filter(|s| !s.is_empty()),
        notification_type: req.notification_type,
        text: req.text,
        post_id: req.post_id,
        comment_id: req.comment_id,
    };

    let view = match state.notification_service.create_notification(pending).await? {
        Some(created) => Some(state.notification_service.view(created).await?),
        None => None,
    };
    Ok(ApiResponse::ok(view))
}

/// Mark a notification read (or unread).
async fn mark_read(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MarkReadRequest>,
) -> AppResult<ApiResponse<NotificationView>> {
    let id = required(req.id, "Notification ID is required")?;
    let updated = state
        .notification_service
        .set_read(&id, req.is_read.unwrap_or(true))
        .await?;
    Ok(ApiResponse::ok(updated))
}

/// Delete one notification or all of a recipient's.
async fn delete(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeleteNotificationsQuery>,
) -> AppResult<Success> {
    let id = query.id.filter(|id| !id.is_empty());
    let recipient = query.recipient_address.filter(|r| !r.is_empty());

    match (id, recipient) {
        (Some(id), _) => state.notification_service.delete(&id).await?,
        (None, Some(recipient)) => {
            state.notification_service.delete_all(&recipient).await?;
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either ID or recipient address is required".to_string(),
            ));
        }
    }

    Ok(Success::ack())
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list).post(create).patch(mark_read).delete(delete),
    )
}
