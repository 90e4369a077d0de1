//! Notification dispatch.
//!
//! Services that trigger a notification (follow, like, comment) hand a
//! [`PendingNotification`] to a [`NotificationDispatcher`] after their own
//! write has succeeded. Dispatch is best-effort: failures are logged and never
//! reach the caller, and the triggering write is never undone.

use std::sync::Arc;

use async_trait::async_trait;
use chainfeed_db::entities::notification::NotificationType;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::services::notification::NotificationService;

/// A notification waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    /// Who receives the notification.
    pub recipient_address: String,
    /// Who triggered it.
    pub sender_address: Option<String>,
    /// What happened.
    pub notification_type: NotificationType,
    /// Raw payload: message body, comment body, or empty.
    pub text: String,
    /// Post the notification refers to.
    pub post_id: Option<String>,
    /// Comment the notification refers to.
    pub comment_id: Option<String>,
}

impl PendingNotification {
    /// A notification with no payload or post reference.
    #[must_use]
    pub fn new(
        notification_type: NotificationType,
        recipient_address: impl Into<String>,
        sender_address: impl Into<String>,
    ) -> Self {
        Self {
            recipient_address: recipient_address.into(),
            sender_address: Some(sender_address.into()),
            notification_type,
            text: String::new(),
            post_id: None,
            comment_id: None,
        }
    }

    /// Attach a raw payload.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Reference a post.
    #[must_use]
    pub fn with_post(mut self, post_id: impl Into<String>) -> Self {
        self.post_id = Some(post_id.into());
        self
    }

    /// Reference a comment.
    #[must_use]
    pub fn with_comment(mut self, comment_id: impl Into<String>) -> Self {
        self.comment_id = Some(comment_id.into());
        self
    }
}

/// Best-effort notification side channel.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Hand off a notification. Never fails.
    async fn dispatch(&self, pending: PendingNotification);
}

/// Shared dispatcher handle.
pub type DispatcherService = Arc<dyn NotificationDispatcher>;

/// Writes the notification before returning, logging any failure.
#[derive(Clone)]
pub struct InlineDispatcher {
    notifications: NotificationService,
}

impl InlineDispatcher {
    /// Create an inline dispatcher.
    #[must_use]
    pub const fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl NotificationDispatcher for InlineDispatcher {
    async fn dispatch(&self, pending: PendingNotification) {
        deliver(&self.notifications, pending).await;
    }
}

/// Queues notifications for a background worker.
///
/// The channel is bounded; when it is full or the worker has stopped the
/// notification is dropped with a warning.
#[derive(Clone)]
pub struct QueuedDispatcher {
    sender: mpsc::Sender<PendingNotification>,
}

/// Handle to the queued dispatcher's worker task.
pub struct DispatchWorker {
    handle: JoinHandle<()>,
}

impl QueuedDispatcher {
    /// Create the dispatcher and spawn its worker.
    ///
    /// The worker stops once every clone of the dispatcher has been dropped
    /// and the queue is empty.
    #[must_use]
    pub fn start(notifications: NotificationService, capacity: usize) -> (Self, DispatchWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        let handle = tokio::spawn(async move {
            info!(capacity, "Notification worker starting");
            run_worker(receiver, notifications).await;
            info!("Notification worker stopped");
        });

        (Self { sender }, DispatchWorker { handle })
    }
}

#[async_trait]
impl NotificationDispatcher for QueuedDispatcher {
    async fn dispatch(&self, pending: PendingNotification) {
        match self.sender.try_send(pending) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(pending)) => {
                warn!(
                    recipient = %pending.recipient_address,
                    kind = ?pending.notification_type,
                    "Notification queue is full, dropping notification"
                );
            }
            Err(mpsc::error::TrySendError::Closed(pending)) => {
                warn!(
                    recipient = %pending.recipient_address,
                    kind = ?pending.notification_type,
                    "Notification worker has stopped, dropping notification"
                );
            }
        }
    }
}

impl DispatchWorker {
    /// Wait for the worker to drain the queue and exit.
    pub async fn finish(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Notification worker panicked");
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<PendingNotification>,
    notifications: NotificationService,
) {
    while let Some(pending) = receiver.recv().await {
        deliver(&notifications, pending).await;
    }
}

async fn deliver(notifications: &NotificationService, pending: PendingNotification) {
    let recipient = pending.recipient_address.clone();
    let kind = pending.notification_type;

    match notifications.create_notification(pending).await {
        Ok(Some(created)) => {
            debug!(id = %created.id, recipient = %recipient, kind = ?kind, "Notification created");
        }
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, recipient = %recipient, kind = ?kind, "Failed to create notification");
        }
    }
}

/// Discards every notification.
#[derive(Clone, Default)]
pub struct NoOpDispatcher;

#[async_trait]
impl NotificationDispatcher for NoOpDispatcher {
    async fn dispatch(&self, _pending: PendingNotification) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chainfeed_db::repositories::{NotificationRepository, UserRepository};
    use chainfeed_db::test_utils::TestDatabase;

    async fn setup() -> (TestDatabase, NotificationService) {
        let db = TestDatabase::in_memory().await.unwrap();
        let users = UserRepository::new(db.connection());
        users.ensure_exists("0xa", None).await.unwrap();
        users.ensure_exists("0xb", None).await.unwrap();

        let service = NotificationService::new(
            NotificationRepository::new(db.connection()),
            users,
        );
        (db, service)
    }

    #[test]
    fn test_pending_builder() {
        let pending = PendingNotification::new(NotificationType::Comment, "0xb", "0xa")
            .with_text("nice")
            .with_post("p1")
            .with_comment("c1");

        assert_eq!(pending.sender_address.as_deref(), Some("0xa"));
        assert_eq!(pending.text, "nice");
        assert_eq!(pending.post_id.as_deref(), Some("p1"));
        assert_eq!(pending.comment_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_inline_dispatch_writes_row() {
        let (_db, service) = setup().await;
        let dispatcher = InlineDispatcher::new(service.clone());

        dispatcher
            .dispatch(PendingNotification::new(NotificationType::Follow, "0xb", "0xa"))
            .await;

        let page = service.list("0xb", 20, 0, false).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].formatted_text, "0xa... started following you");
    }

    #[tokio::test]
    async fn test_inline_dispatch_swallows_errors() {
        let (_db, service) = setup().await;
        let dispatcher = InlineDispatcher::new(service.clone());

        // Unknown recipient violates the foreign key; dispatch must not fail.
        dispatcher
            .dispatch(PendingNotification::new(NotificationType::Like, "0xmissing", "0xa"))
            .await;

        assert_eq!(service.list("0xmissing", 20, 0, true).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_queued_dispatch_drains_on_shutdown() {
        let (_db, service) = setup().await;
        let (dispatcher, worker) = QueuedDispatcher::start(service.clone(), 8);

        for _ in 0..3 {
            dispatcher
                .dispatch(PendingNotification::new(NotificationType::Like, "0xb", "0xa"))
                .await;
        }
        drop(dispatcher);
        worker.finish().await;

        assert_eq!(service.list("0xb", 20, 0, false).await.unwrap().total, 3);
    }
}
