//! Friend service.
//!
//! Friendship is symmetric: adding `a -> b` also records `b -> a`, and
//! removing one direction removes both.

use chainfeed_common::{AppError, AppResult};
use chainfeed_db::{
    entities::friend,
    repositories::{FriendRepository, UserRepository},
};

use crate::services::user::{UserService, UserWithCounts, default_display_name};

/// Friend service for business logic.
#[derive(Clone)]
pub struct FriendService {
    friend_repo: FriendRepository,
    user_repo: UserRepository,
    user_service: UserService,
}

impl FriendService {
    /// Create a new friend service.
    #[must_use]
    pub const fn new(
        friend_repo: FriendRepository,
        user_repo: UserRepository,
        user_service: UserService,
    ) -> Self {
        Self {
            friend_repo,
            user_repo,
            user_service,
        }
    }

    /// Befriend `friend_address`.
    pub async fn add_friend(
        &self,
        user_address: &str,
        friend_address: &str,
    ) -> AppResult<friend::Model> {
        if friend_address.trim().is_empty() {
            return Err(AppError::Validation("Friend address is required".to_string()));
        }
        if user_address == friend_address {
            return Err(AppError::Validation(
                "Cannot add yourself as a friend".to_string(),
            ));
        }

        self.user_repo.get_by_address(friend_address).await?;
        self.user_repo
            .ensure_exists(user_address, Some(default_display_name(user_address)))
            .await?;

        if self
            .friend_repo
            .find_by_pair(user_address, friend_address)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Friendship already exists".to_string()));
        }

        let row = self
            .friend_repo
            .create_pair(user_address, friend_address)
            .await?;

        tracing::info!(user = %user_address, friend = %friend_address, "Added friend");
        Ok(row)
    }

    /// Remove a friendship in both directions.
    pub async fn remove_friend(&self, user_address: &str, friend_address: &str) -> AppResult<()> {
        if friend_address.trim().is_empty() {
            return Err(AppError::Validation("Friend address is required".to_string()));
        }

        if !self
            .friend_repo
            .delete_pair(user_address, friend_address)
            .await?
        {
            return Err(AppError::NotFound("Friendship not found".to_string()));
        }

        tracing::info!(user = %user_address, friend = %friend_address, "Removed friend");
        Ok(())
    }

    /// Friends of `user_address`, most recent first, with counts.
    pub async fn list_friends(&self, user_address: &str) -> AppResult<Vec<UserWithCounts>> {
        let addresses = self.friend_repo.friend_addresses(user_address).await?;
        let users = self.user_repo.find_by_addresses(&addresses).await?;

        let ordered = addresses
            .iter()
            .filter_map(|a| users.iter().find(|u| &u.wallet_address == a).cloned())
            .collect();

        self.user_service.with_counts(ordered).await
    }

    /// Addresses of `user_address`'s friends.
    pub async fn friend_addresses(&self, user_address: &str) -> AppResult<Vec<String>> {
        self.friend_repo.friend_addresses(user_address).await
    }
}
