//! Friend repository.
//!
//! A friendship is two rows. Both are inserted or deleted inside one
//! transaction so a half-written friendship is never visible.

use std::sync::Arc;

use crate::entities::{Friend, friend};
use crate::write_err;
use chainfeed_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Friend repository for database operations.
#[derive(Clone)]
pub struct FriendRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl FriendRepository {
    /// Create a new friend repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find the directed row `user -> friend`.
    pub async fn find_by_pair(
        &self,
        user_address: &str,
        friend_address: &str,
    ) -> AppResult<Option<friend::Model>> {
        Self::find_pair_on(self.db.as_ref(), user_address, friend_address).await
    }

    async fn find_pair_on<C: ConnectionTrait>(
        conn: &C,
        user_address: &str,
        friend_address: &str,
    ) -> AppResult<Option<friend::Model>> {
        Friend::find()
            .filter(friend::Column::UserAddress.eq(user_address))
            .filter(friend::Column::FriendAddress.eq(friend_address))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert both directions of a friendship atomically.
    ///
    /// Returns the `user -> friend` row. If either insert fails nothing is
    /// written; a duplicate direction surfaces as `Conflict`.
    pub async fn create_pair(
        &self,
        user_address: &str,
        friend_address: &str,
    ) -> AppResult<friend::Model> {
        let txn = self.begin().await?;

        match self.insert_pair(&txn, user_address, friend_address).await {
            Ok(forward) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(forward)
            }
            Err(e) => {
                Self::rollback(txn).await;
                Err(e)
            }
        }
    }

    async fn insert_pair(
        &self,
        txn: &DatabaseTransaction,
        user_address: &str,
        friend_address: &str,
    ) -> AppResult<friend::Model> {
        let now = Utc::now();
        let forward = friend::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_address: Set(user_address.to_string()),
            friend_address: Set(friend_address.to_string()),
            created_at: Set(now.into()),
        };
        let reverse = friend::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_address: Set(friend_address.to_string()),
            friend_address: Set(user_address.to_string()),
            created_at: Set(now.into()),
        };

        let forward = forward
            .insert(txn)
            .await
            .map_err(|e| write_err(e, "Friendship"))?;
        reverse
            .insert(txn)
            .await
            .map_err(|e| write_err(e, "Friendship"))?;

        Ok(forward)
    }

    /// Delete both directions of a friendship atomically.
    ///
    /// Returns false, removing nothing, if either direction is missing.
    pub async fn delete_pair(&self, user_address: &str, friend_address: &str) -> AppResult<bool> {
        let txn = self.begin().await?;

        let forward = Self::find_pair_on(&txn, user_address, friend_address).await;
        let reverse = Self::find_pair_on(&txn, friend_address, user_address).await;

        let (forward, reverse) = match (forward, reverse) {
            (Ok(Some(forward)), Ok(Some(reverse))) => (forward, reverse),
            (Ok(_), Ok(_)) => {
                Self::rollback(txn).await;
                return Ok(false);
            }
            (Err(e), _) | (_, Err(e)) => {
                Self::rollback(txn).await;
                return Err(e);
            }
        };

        let deleted = Friend::delete_many()
            .filter(friend::Column::Id.is_in([forward.id, reverse.id]))
            .exec(&txn)
            .await;

        match deleted {
            Ok(_) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(true)
            }
            Err(e) => {
                Self::rollback(txn).await;
                Err(AppError::Database(e.to_string()))
            }
        }
    }

    /// Addresses of a user's friends, most recent first.
    pub async fn friend_addresses(&self, user_address: &str) -> AppResult<Vec<String>> {
        Friend::find()
            .select_only()
            .column(friend::Column::FriendAddress)
            .filter(friend::Column::UserAddress.eq(user_address))
            .order_by_desc(friend::Column::CreatedAt)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn rollback(txn: DatabaseTransaction) {
        if let Err(e) = txn.rollback().await {
            tracing::warn!(error = %e, "Failed to roll back friend transaction");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_friend(id: &str, user: &str, friend: &str) -> friend::Model {
        friend::Model {
            id: id.to_string(),
            user_address: user.to_string(),
            friend_address: friend.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair() {
        let row = create_test_friend("fr1", "0xa", "0xb");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row]])
            .into_connection();

        let repo = FriendRepository::new(Arc::new(db));
        let found = repo.find_by_pair("0xa", "0xb").await.unwrap().unwrap();

        assert_eq!(found.friend_address, "0xb");
    }

    #[tokio::test]
    async fn test_delete_pair_missing_reverse_removes_nothing() {
        let forward = create_test_friend("fr1", "0xa", "0xb");

        // Forward row exists, reverse lookup comes back empty; no delete is
        // issued, so no exec result is needed.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![forward]])
            .append_query_results([Vec::<friend::Model>::new()])
            .into_connection();

        let repo = FriendRepository::new(Arc::new(db));
        assert!(!repo.delete_pair("0xa", "0xb").await.unwrap());
    }
}
