//! Follow repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Follow, follow};
use crate::write_err;
use chainfeed_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow edge by follower and followed user.
    pub async fn find_by_pair(
        &self,
        follower_address: &str,
        following_address: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerAddress.eq(follower_address))
            .filter(follow::Column::FollowingAddress.eq(following_address))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is following another user.
    pub async fn is_following(
        &self,
        follower_address: &str,
        following_address: &str,
    ) -> AppResult<bool> {
        Ok(self
            .find_by_pair(follower_address, following_address)
            .await?
            .is_some())
    }

    /// Create a new follow edge. A duplicate edge is a `Conflict`.
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Follow"))
    }

    /// Delete a follow edge. Returns false if there was none.
    pub async fn delete_by_pair(
        &self,
        follower_address: &str,
        following_address: &str,
    ) -> AppResult<bool> {
        let Some(edge) = self
            .find_by_pair(follower_address, following_address)
            .await?
        else {
            return Ok(false);
        };

        edge.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Addresses a user follows, most recent first.
    pub async fn following_addresses(&self, follower_address: &str) -> AppResult<Vec<String>> {
        Follow::find()
            .select_only()
            .column(follow::Column::FollowingAddress)
            .filter(follow::Column::FollowerAddress.eq(follower_address))
            .order_by_desc(follow::Column::CreatedAt)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, address: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowingAddress.eq(address))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users a user follows.
    pub async fn count_following(&self, address: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowerAddress.eq(address))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Follower counts for several users in one query. Users with no
    /// followers are absent from the map.
    pub async fn count_followers_for(&self, addresses: &[String]) -> AppResult<HashMap<String, u64>> {
        self.grouped_count(follow::Column::FollowingAddress, addresses)
            .await
    }

    /// Following counts for several users in one query.
    pub async fn count_following_for(&self, addresses: &[String]) -> AppResult<HashMap<String, u64>> {
        self.grouped_count(follow::Column::FollowerAddress, addresses)
            .await
    }

    async fn grouped_count(
        &self,
        column: follow::Column,
        addresses: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Follow::find()
            .select_only()
            .column(column)
            .column_as(Expr::col(follow::Column::Id).count(), "count")
            .filter(column.is_in(addresses.iter().cloned()))
            .group_by(column)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(address, count)| (address, count as u64))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_follow(id: &str, follower: &str, following: &str) -> follow::Model {
        follow::Model {
            id: id.to_string(),
            follower_address: follower.to_string(),
            following_address: following.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_following_true() {
        let edge = create_test_follow("f1", "0xa", "0xb");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[edge]])
            .into_connection();

        let repo = FollowRepository::new(Arc::new(db));
        assert!(repo.is_following("0xa", "0xb").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_following_false() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<follow::Model>::new()])
            .into_connection();

        let repo = FollowRepository::new(Arc::new(db));
        assert!(!repo.is_following("0xa", "0xb").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_missing_edge() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<follow::Model>::new()])
            .into_connection();

        let repo = FollowRepository::new(Arc::new(db));
        assert!(!repo.delete_by_pair("0xa", "0xb").await.unwrap());
    }

    #[tokio::test]
    async fn test_grouped_count_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = FollowRepository::new(Arc::new(db));

        assert!(repo.count_followers_for(&[]).await.unwrap().is_empty());
    }
}
