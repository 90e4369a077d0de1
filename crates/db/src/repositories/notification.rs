//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use chainfeed_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn inbox(recipient_address: &str, include_read: bool) -> Select<Notification> {
        let query = Notification::find()
            .filter(notification::Column::RecipientAddress.eq(recipient_address));

        if include_read {
            query
        } else {
            query.filter(notification::Column::IsRead.eq(false))
        }
    }

    /// Notifications for a recipient, newest first (offset paginated).
    pub async fn find_by_recipient(
        &self,
        recipient_address: &str,
        include_read: bool,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<notification::Model>> {
        Self::inbox(recipient_address, include_read)
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count notifications for a recipient under the same filter as
    /// [`Self::find_by_recipient`].
    pub async fn count_by_recipient(
        &self,
        recipient_address: &str,
        include_read: bool,
    ) -> AppResult<u64> {
        Self::inbox(recipient_address, include_read)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the read flag on a notification.
    pub async fn set_read(&self, id: &str, is_read: bool) -> AppResult<notification::Model> {
        let notification = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification: {id}")))?;

        let mut active: notification::ActiveModel = notification.into();
        active.is_read = Set(is_read);
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a notification.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let notification = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification: {id}")))?;

        notification
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all notifications for a recipient.
    pub async fn delete_all_for_recipient(&self, recipient_address: &str) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::RecipientAddress.eq(recipient_address))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::notification::NotificationType;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(id: &str, recipient: &str, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_address: recipient.to_string(),
            sender_address: Some("0xsender".to_string()),
            notification_type: NotificationType::Like,
            text: String::new(),
            post_id: Some("p1".to_string()),
            comment_id: None,
            is_read,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_recipient() {
        let rows = vec![
            create_test_notification("n2", "0xa", false),
            create_test_notification("n1", "0xa", false),
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();

        let repo = NotificationRepository::new(Arc::new(db));
        let found = repo.find_by_recipient("0xa", false, 20, 0).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].notification_type, NotificationType::Like);
    }

    #[tokio::test]
    async fn test_set_read_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<notification::Model>::new()])
            .into_connection();

        let repo = NotificationRepository::new(Arc::new(db));
        let result = repo.set_read("missing", true).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_all_for_recipient() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        let repo = NotificationRepository::new(Arc::new(db));
        assert_eq!(repo.delete_all_for_recipient("0xa").await.unwrap(), 3);
    }
}
