//! Direct messages.
//!
//! A message is stored as a MESSAGE notification for its recipient.

use chainfeed_common::{AppError, AppResult};
use chainfeed_db::{entities::notification::NotificationType, repositories::UserRepository};
use serde::Deserialize;
use validator::Validate;

use crate::services::dispatch::PendingNotification;
use crate::services::notification::{NotificationService, NotificationView};

/// Input for sending a message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    /// Wallet address of the sender.
    #[validate(length(min = 1, max = 128))]
    pub sender_address: String,

    /// Wallet address of the recipient. Must be a known user.
    #[validate(length(min = 1, max = 128))]
    pub recipient_address: String,

    /// Message body.
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    user_repo: UserRepository,
    notifications: NotificationService,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, notifications: NotificationService) -> Self {
        Self {
            user_repo,
            notifications,
        }
    }

    /// Send a message.
    ///
    /// The notification is written before returning. Returns `None` when the
    /// sender is the recipient.
    pub async fn send(&self, input: SendMessageInput) -> AppResult<Option<NotificationView>> {
        input.validate().map_err(|_| {
            AppError::Validation(
                "Sender address, recipient address, and message are required".to_string(),
            )
        })?;

        if self
            .user_repo
            .find_by_address(&input.recipient_address)
            .await?
            .is_none()
        {
            return Err(AppError::UserNotFound(input.recipient_address));
        }

        let pending = PendingNotification::new(
            NotificationType::Message,
            input.recipient_address,
            input.sender_address,
        )
        .with_text(input.message);

        match self.notifications.create_notification(pending).await? {
            Some(created) => {
                tracing::debug!(id = %created.id, "Message sent");
                self.notifications.view(created).await.map(Some)
            }
            None => Ok(None),
        }
    }
}
