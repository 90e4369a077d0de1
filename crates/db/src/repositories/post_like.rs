//! Post like repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{PostLike, post_like};
use crate::write_err;
use chainfeed_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by post and user.
    pub async fn find_by_pair(
        &self,
        post_id: &str,
        user_address: &str,
    ) -> AppResult<Option<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::UserAddress.eq(user_address))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a like. The unique `(post_id, user_address)` index turns a
    /// duplicate into `Conflict`; there is no pre-check.
    pub async fn create(&self, model: post_like::ActiveModel) -> AppResult<post_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Like"))
    }

    /// Delete a like. Returns false if there was none.
    pub async fn delete_by_pair(&self, post_id: &str, user_address: &str) -> AppResult<bool> {
        let Some(like) = self.find_by_pair(post_id, user_address).await? else {
            return Ok(false);
        };

        like.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Likes on any of the given posts, oldest first.
    pub async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<post_like::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        PostLike::find()
            .filter(post_like::Column::PostId.is_in(post_ids.iter().cloned()))
            .order_by_asc(post_like::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ids of posts a user has liked.
    pub async fn post_ids_by_user(&self, user_address: &str) -> AppResult<Vec<String>> {
        PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .filter(post_like::Column::UserAddress.eq(user_address))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Group likes by post id.
    #[must_use]
    pub fn group_by_post(likes: Vec<post_like::Model>) -> HashMap<String, Vec<post_like::Model>> {
        let mut grouped: HashMap<String, Vec<post_like::Model>> = HashMap::new();
        for like in likes {
            grouped.entry(like.post_id.clone()).or_default().push(like);
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

    fn create_test_like(id: &str, post_id: &str, user: &str) -> post_like::Model {
        post_like::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            user_address: user.to_string(),
            transaction_hash: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair() {
        let like = create_test_like("l1", "p1", "0xa");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[like]])
            .into_connection();

        let repo = PostLikeRepository::new(Arc::new(db));
        let found = repo.find_by_pair("p1", "0xa").await.unwrap();

        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_like() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post_like::Model>::new()])
            .into_connection();

        let repo = PostLikeRepository::new(Arc::new(db));
        assert!(!repo.delete_by_pair("p1", "0xa").await.unwrap());
    }

    #[test]
    fn test_group_by_post() {
        let grouped = PostLikeRepository::group_by_post(vec![
            create_test_like("l1", "p1", "0xa"),
            create_test_like("l2", "p1", "0xb"),
            create_test_like("l3", "p2", "0xa"),
        ]);

        assert_eq!(grouped["p1"].len(), 2);
        assert_eq!(grouped["p2"].len(), 1);
    }
}
