//! User repository.

use std::sync::Arc;

use super::contains_pattern;
use crate::entities::{User, user};
use crate::write_err;
use chainfeed_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};

/// Profile fields written by an upsert. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    /// Username.
    pub username: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Biography.
    pub bio: Option<String>,
    /// Gender.
    pub gender: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Avatar source photo URL.
    pub avatar_real_url: Option<String>,
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by wallet address.
    pub async fn find_by_address(&self, address: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(address)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by wallet address, returning an error if not found.
    pub async fn get_by_address(&self, address: &str) -> AppResult<user::Model> {
        self.find_by_address(address)
            .await?
            .ok_or_else(|| AppError::UserNotFound(address.to_string()))
    }

    /// Find users by wallet addresses.
    pub async fn find_by_addresses(&self, addresses: &[String]) -> AppResult<Vec<user::Model>> {
        if addresses.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::WalletAddress.is_in(addresses.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all users, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search users whose address, username or display name contains `query`
    /// (case-insensitive).
    pub async fn search(&self, query: &str, limit: u64) -> AppResult<Vec<user::Model>> {
        let pattern = contains_pattern(query);
        let contains = |column: user::Column| {
            Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone())
        };

        User::find()
            .filter(
                Condition::any()
                    .add(contains(user::Column::WalletAddress))
                    .add(contains(user::Column::Username))
                    .add(contains(user::Column::DisplayName)),
            )
            .order_by_desc(user::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "User"))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Return the user, creating a bare row with `display_name` if missing.
    pub async fn ensure_exists(
        &self,
        address: &str,
        display_name: Option<String>,
    ) -> AppResult<user::Model> {
        if let Some(existing) = self.find_by_address(address).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            wallet_address: Set(address.to_string()),
            username: Set(None),
            display_name: Set(display_name),
            bio: Set(None),
            gender: Set(None),
            avatar_url: Set(None),
            avatar_real_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match self.create(model).await {
            Ok(created) => Ok(created),
            // Lost a race with a concurrent insert of the same address.
            Err(AppError::Conflict(_)) => self.get_by_address(address).await,
            Err(e) => Err(e),
        }
    }

    /// Create or update a user's profile fields.
    pub async fn upsert_profile(
        &self,
        address: &str,
        changes: ProfileChanges,
    ) -> AppResult<user::Model> {
        let existing = self.ensure_exists(address, None).await?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(username) = changes.username {
            active.username = Set(Some(username));
        }
        if let Some(display_name) = changes.display_name {
            active.display_name = Set(Some(display_name));
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(gender) = changes.gender {
            active.gender = Set(Some(gender));
        }
        if let Some(avatar_url) = changes.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(avatar_real_url) = changes.avatar_real_url {
            active.avatar_real_url = Set(Some(avatar_real_url));
        }
        active.updated_at = Set(Utc::now().into());

        self.update(active).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(address: &str, display_name: Option<&str>) -> user::Model {
        user::Model {
            wallet_address: address.to_string(),
            username: None,
            display_name: display_name.map(ToString::to_string),
            bio: None,
            gender: None,
            avatar_url: None,
            avatar_real_url: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_address_found() {
        let user = create_test_user("0xabc", Some("Alice"));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()]])
            .into_connection();

        let repo = UserRepository::new(Arc::new(db));
        let found = repo.find_by_address("0xabc").await.unwrap().unwrap();

        assert_eq!(found.wallet_address, "0xabc");
        assert_eq!(found.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_get_by_address_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let repo = UserRepository::new(Arc::new(db));
        let result = repo.get_by_address("0xmissing").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_ensure_exists_returns_existing_without_insert() {
        let user = create_test_user("0xabc", Some("Alice"));

        // Only one query result: an insert would fail the mock.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let repo = UserRepository::new(Arc::new(db));
        let found = repo.ensure_exists("0xabc", Some("User 0xabc".into())).await.unwrap();

        assert_eq!(found.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_find_by_addresses_empty_skips_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = UserRepository::new(Arc::new(db));

        assert!(repo.find_by_addresses(&[]).await.unwrap().is_empty());
    }
}
