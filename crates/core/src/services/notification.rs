//! Notification service.

use std::collections::HashMap;

use chainfeed_common::{AppResult, IdGenerator};
use chainfeed_db::{
    entities::{
        notification::{self, NotificationType},
        user,
    },
    repositories::{NotificationRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::Set;
use serde::Serialize;

use crate::services::dispatch::PendingNotification;
use crate::services::user::UserSummary;

/// Default page size for notification listings.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Message previews longer than this are truncated.
const PREVIEW_MAX_CHARS: usize = 50;
const PREVIEW_KEEP_CHARS: usize = 47;

/// A notification as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    /// Notification id.
    pub id: String,
    /// Who receives it.
    pub recipient_address: String,
    /// Who triggered it.
    pub sender_address: Option<String>,
    /// What happened.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Raw payload as stored.
    pub text: String,
    /// Related post.
    pub post_id: Option<String>,
    /// Related comment.
    pub comment_id: Option<String>,
    /// Read flag.
    pub is_read: bool,
    /// Creation time.
    pub created_at: DateTimeWithTimeZone,
    /// Last update time.
    pub updated_at: DateTimeWithTimeZone,
    /// Display text, see [`format_notification_text`].
    pub formatted_text: String,
    /// The sender, when the user row exists.
    pub sender: Option<UserSummary>,
}

impl NotificationView {
    fn new(model: notification::Model, sender: Option<&user::Model>) -> Self {
        let name = sender_name(sender, model.sender_address.as_deref());
        let formatted_text = format_notification_text(
            model.notification_type,
            &name,
            Some(model.text.as_str()),
        );

        Self {
            id: model.id,
            recipient_address: model.recipient_address,
            sender_address: model.sender_address,
            notification_type: model.notification_type,
            text: model.text,
            post_id: model.post_id,
            comment_id: model.comment_id,
            is_read: model.is_read,
            created_at: model.created_at,
            updated_at: model.updated_at,
            formatted_text,
            sender: sender.cloned().map(UserSummary::from),
        }
    }
}

/// One page of a recipient's notifications.
#[derive(Debug, Clone)]
pub struct NotificationPage {
    /// Notifications on this page, newest first.
    pub data: Vec<NotificationView>,
    /// Number of notifications under the same filter, ignoring paging.
    pub total: u64,
}

/// Human-readable text for a notification.
#[must_use]
pub fn format_notification_text(
    notification_type: NotificationType,
    sender_name: &str,
    preview: Option<&str>,
) -> String {
    match notification_type {
        NotificationType::Follow => format!("{sender_name} started following you"),
        NotificationType::Like => format!("{sender_name} liked your post"),
        NotificationType::Comment => format!("{sender_name} commented on your post"),
        NotificationType::Message => match preview.filter(|p| !p.is_empty()) {
            Some(preview) => {
                format!("{sender_name} sent you a message: \"{}\"", truncate_preview(preview))
            }
            None => format!("{sender_name} sent you a message"),
        },
    }
}

fn truncate_preview(preview: &str) -> String {
    if preview.chars().count() > PREVIEW_MAX_CHARS {
        let kept: String = preview.chars().take(PREVIEW_KEEP_CHARS).collect();
        format!("{kept}...")
    } else {
        preview.to_string()
    }
}

/// Name shown for a notification's sender.
///
/// Prefers the display name, then the username, then a shortened address.
#[must_use]
pub fn sender_name(sender: Option<&user::Model>, sender_address: Option<&str>) -> String {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

    sender
        .and_then(|u| non_empty(&u.display_name).or_else(|| non_empty(&u.username)))
        .or_else(|| {
            sender_address.map(|address| {
                let short: String = address.chars().take(8).collect();
                format!("{short}...")
            })
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self {
            notification_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Write a notification.
    ///
    /// Returns `None` without writing anything when the sender is the
    /// recipient.
    pub async fn create_notification(
        &self,
        pending: PendingNotification,
    ) -> AppResult<Option<notification::Model>> {
        if pending.sender_address.as_deref() == Some(pending.recipient_address.as_str()) {
            return Ok(None);
        }

        let now = Utc::now();
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_address: Set(pending.recipient_address),
            sender_address: Set(pending.sender_address),
            notification_type: Set(pending.notification_type),
            text: Set(pending.text),
            post_id: Set(pending.post_id),
            comment_id: Set(pending.comment_id),
            is_read: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        self.notification_repo.create(model).await.map(Some)
    }

    /// A recipient's notifications, newest first, with sender details.
    pub async fn list(
        &self,
        recipient_address: &str,
        limit: u64,
        offset: u64,
        include_read: bool,
    ) -> AppResult<NotificationPage> {
        let total = self
            .notification_repo
            .count_by_recipient(recipient_address, include_read)
            .await?;
        let models = self
            .notification_repo
            .find_by_recipient(recipient_address, include_read, limit, offset)
            .await?;

        Ok(NotificationPage {
            data: self.decorate(models).await?,
            total,
        })
    }

    /// Mark a notification read or unread.
    pub async fn set_read(&self, id: &str, is_read: bool) -> AppResult<NotificationView> {
        let model = self.notification_repo.set_read(id, is_read).await?;
        self.view(model).await
    }

    /// Delete one notification.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.notification_repo.delete(id).await
    }

    /// Delete every notification of a recipient.
    pub async fn delete_all(&self, recipient_address: &str) -> AppResult<u64> {
        let deleted = self
            .notification_repo
            .delete_all_for_recipient(recipient_address)
            .await?;
        tracing::debug!(recipient = %recipient_address, deleted, "Cleared notifications");
        Ok(deleted)
    }

    /// Decorate a single notification with its sender.
    pub async fn view(&self, model: notification::Model) -> AppResult<NotificationView> {
        let sender = match model.sender_address.as_deref() {
            Some(address) => self.user_repo.find_by_address(address).await?,
            None => None,
        };
        Ok(NotificationView::new(model, sender.as_ref()))
    }

    async fn decorate(&self, models: Vec<notification::Model>) -> AppResult<Vec<NotificationView>> {
        let mut senders: Vec<String> = models
            .iter()
            .filter_map(|n| n.sender_address.clone())
            .collect();
        senders.sort();
        senders.dedup();

        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_addresses(&senders)
            .await?
            .into_iter()
            .map(|u| (u.wallet_address.clone(), u))
            .collect();

        Ok(models
            .into_iter()
            .map(|model| {
                let sender = model.sender_address.as_ref().and_then(|a| users.get(a));
                NotificationView::new(model, sender)
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chainfeed_common::AppError;
    use chainfeed_db::repositories::ProfileChanges;
    use chainfeed_db::test_utils::TestDatabase;

    fn named(display_name: Option<&str>, username: Option<&str>) -> user::Model {
        user::Model {
            wallet_address: "0x1234567890abcdef".to_string(),
            username: username.map(ToString::to_string),
            display_name: display_name.map(ToString::to_string),
            bio: None,
            gender: None,
            avatar_url: None,
            avatar_real_url: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    async fn setup() -> (TestDatabase, NotificationService) {
        let db = TestDatabase::in_memory().await.unwrap();
        let users = UserRepository::new(db.connection());
        users
            .upsert_profile(
                "0xalice",
                ProfileChanges {
                    display_name: Some("Alice".to_string()),
                    ..ProfileChanges::default()
                },
            )
            .await
            .unwrap();
        users.ensure_exists("0xbob", None).await.unwrap();

        let service = NotificationService::new(NotificationRepository::new(db.connection()), users);
        (db, service)
    }

    #[test]
    fn test_format_like() {
        assert_eq!(
            format_notification_text(NotificationType::Like, "Alice", None),
            "Alice liked your post"
        );
    }

    #[test]
    fn test_format_follow_and_comment() {
        assert_eq!(
            format_notification_text(NotificationType::Follow, "Bob", None),
            "Bob started following you"
        );
        assert_eq!(
            format_notification_text(NotificationType::Comment, "Bob", Some("ignored")),
            "Bob commented on your post"
        );
    }

    #[test]
    fn test_format_message_truncates_long_preview() {
        let long = "a".repeat(51);
        let text = format_notification_text(NotificationType::Message, "Alice", Some(&long));
        assert_eq!(text, format!("Alice sent you a message: \"{}...\"", "a".repeat(47)));

        let exact = "b".repeat(50);
        let text = format_notification_text(NotificationType::Message, "Alice", Some(&exact));
        assert_eq!(text, format!("Alice sent you a message: \"{exact}\""));
    }

    #[test]
    fn test_format_message_without_preview() {
        assert_eq!(
            format_notification_text(NotificationType::Message, "Alice", Some("")),
            "Alice sent you a message"
        );
        assert_eq!(
            format_notification_text(NotificationType::Message, "Alice", None),
            "Alice sent you a message"
        );
    }

    #[test]
    fn test_sender_name_fallbacks() {
        let both = named(Some("Alice"), Some("alice"));
        assert_eq!(sender_name(Some(&both), Some("0x1234567890abcdef")), "Alice");

        let username_only = named(Some(""), Some("alice"));
        assert_eq!(sender_name(Some(&username_only), None), "alice");

        let anonymous = named(None, None);
        assert_eq!(
            sender_name(Some(&anonymous), Some("0x1234567890abcdef")),
            "0x123456..."
        );
        assert_eq!(sender_name(None, Some("0xshort")), "0xshort...");
        assert_eq!(sender_name(None, None), "Unknown");
    }

    #[tokio::test]
    async fn test_self_notification_writes_nothing() {
        let (_db, service) = setup().await;

        let created = service
            .create_notification(PendingNotification::new(
                NotificationType::Like,
                "0xalice",
                "0xalice",
            ))
            .await
            .unwrap();

        assert!(created.is_none());
        assert_eq!(service.list("0xalice", 20, 0, true).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_list_formats_and_paginates() {
        let (_db, service) = setup().await;

        for text in ["first", "second", "third"] {
            service
                .create_notification(
                    PendingNotification::new(NotificationType::Message, "0xbob", "0xalice")
                        .with_text(text),
                )
                .await
                .unwrap();
        }

        let page = service.list("0xbob", 2, 0, false).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].formatted_text, "Alice sent you a message: \"third\"");
        assert_eq!(
            page.data[0].sender.as_ref().unwrap().user.wallet_address,
            "0xalice"
        );

        let rest = service.list("0xbob", 2, 2, false).await.unwrap();
        assert_eq!(rest.data.len(), 1);
        assert_eq!(rest.data[0].text, "first");
    }

    #[tokio::test]
    async fn test_read_notifications_hidden_by_default() {
        let (_db, service) = setup().await;
        let created = service
            .create_notification(PendingNotification::new(
                NotificationType::Follow,
                "0xbob",
                "0xalice",
            ))
            .await
            .unwrap()
            .unwrap();

        let view = service.set_read(&created.id, true).await.unwrap();
        assert!(view.is_read);

        assert_eq!(service.list("0xbob", 20, 0, false).await.unwrap().total, 0);
        assert_eq!(service.list("0xbob", 20, 0, true).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_db, service) = setup().await;

        assert!(matches!(
            service.delete("missing").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.set_read("missing", true).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_all() {
        let (_db, service) = setup().await;
        for _ in 0..2 {
            service
                .create_notification(PendingNotification::new(
                    NotificationType::Like,
                    "0xbob",
                    "0xalice",
                ))
                .await
                .unwrap();
        }

        assert_eq!(service.delete_all("0xbob").await.unwrap(), 2);
        assert_eq!(service.list("0xbob", 20, 0, true).await.unwrap().total, 0);
    }
}
