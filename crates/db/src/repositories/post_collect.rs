//! Post collect repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{PostCollect, post_collect};
use crate::write_err;
use chainfeed_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Post collect repository for database operations.
#[derive(Clone)]
pub struct PostCollectRepository {
    db: Arc<DatabaseConnection>,
}

impl PostCollectRepository {
    /// Create a new post collect repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a collect by post and user.
    pub async fn find_by_pair(
        &self,
        post_id: &str,
        user_address: &str,
    ) -> AppResult<Option<post_collect::Model>> {
        PostCollect::find()
            .filter(post_collect::Column::PostId.eq(post_id))
            .filter(post_collect::Column::UserAddress.eq(user_address))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a collect. The unique `(post_id, user_address)` index turns a
    /// duplicate into `Conflict`; there is no pre-check.
    pub async fn create(&self, model: post_collect::ActiveModel) -> AppResult<post_collect::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Collect"))
    }

    /// Delete a collect. Returns false if there was none.
    pub async fn delete_by_pair(&self, post_id: &str, user_address: &str) -> AppResult<bool> {
        let Some(collect) = self.find_by_pair(post_id, user_address).await? else {
            return Ok(false);
        };

        collect.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Collects on any of the given posts, oldest first.
    pub async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<post_collect::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        PostCollect::find()
            .filter(post_collect::Column::PostId.is_in(post_ids.iter().cloned()))
            .order_by_asc(post_collect::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ids of posts a user has collected.
    pub async fn post_ids_by_user(&self, user_address: &str) -> AppResult<Vec<String>> {
        PostCollect::find()
            .select_only()
            .column(post_collect::Column::PostId)
            .filter(post_collect::Column::UserAddress.eq(user_address))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count collects on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostCollect::find()
            .filter(post_collect::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Group collects by post id.
    #[must_use]
    pub fn group_by_post(collects: Vec<post_collect::Model>) -> HashMap<String, Vec<post_collect::Model>> {
        let mut grouped: HashMap<String, Vec<post_collect::Model>> = HashMap::new();
        for collect in collects {
            grouped.entry(collect.post_id.clone()).or_default().push(collect);
        }
        grouped
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_collect(id: &str, post_id: &str, user: &str) -> post_collect::Model {
        post_collect::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            user_address: user.to_string(),
            transaction_hash: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair() {
        let collect = create_test_collect("c1", "p1", "0xa");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[collect]])
            .into_connection();

        let repo = PostCollectRepository::new(Arc::new(db));
        let found = repo.find_by_pair("p1", "0xa").await.unwrap();

        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_collect() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post_collect::Model>::new()])
            .into_connection();

        let repo = PostCollectRepository::new(Arc::new(db));
        assert!(!repo.delete_by_pair("p1", "0xa").await.unwrap());
    }

    #[test]
    fn test_group_by_post() {
        let grouped = PostCollectRepository::group_by_post(vec![
            create_test_collect("c1", "p1", "0xa"),
            create_test_collect("c2", "p1", "0xb"),
            create_test_collect("c3", "p2", "0xa"),
        ]);

        assert_eq!(grouped["p1"].len(), 2);
        assert_eq!(grouped["p2"].len(), 1);
    }
}
