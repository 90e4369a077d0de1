//! Following service.

use chainfeed_common::{AppError, AppResult, IdGenerator};
use chainfeed_db::{
    entities::{follow, notification::NotificationType},
    repositories::{FollowRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::Set;

use crate::services::dispatch::{DispatcherService, PendingNotification};
use crate::services::user::{UserService, UserWithCounts, default_display_name};

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    user_service: UserService,
    dispatcher: DispatcherService,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(
        follow_repo: FollowRepository,
        user_repo: UserRepository,
        user_service: UserService,
        dispatcher: DispatcherService,
    ) -> Self {
        Self {
            follow_repo,
            user_repo,
            user_service,
            dispatcher,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a user.
    ///
    /// The follower is created if it has never been seen; the followed user
    /// must already exist.
    pub async fn follow(
        &self,
        follower_address: &str,
        following_address: &str,
    ) -> AppResult<follow::Model> {
        if follower_address.trim().is_empty() {
            return Err(AppError::Validation(
                "Follower address is required".to_string(),
            ));
        }
        if follower_address == following_address {
            return Err(AppError::Validation("Cannot follow yourself".to_string()));
        }

        self.user_repo.get_by_address(following_address).await?;
        self.user_repo
            .ensure_exists(follower_address, Some(default_display_name(follower_address)))
            .await?;

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_address: Set(follower_address.to_string()),
            following_address: Set(following_address.to_string()),
            created_at: Set(Utc::now().into()),
        };
        let edge = self.follow_repo.create(model).await?;

        tracing::info!(follower = %follower_address, following = %following_address, "Followed user");

        self.dispatcher
            .dispatch(PendingNotification::new(
                NotificationType::Follow,
                following_address,
                follower_address,
            ))
            .await;

        Ok(edge)
    }

    /// Unfollow a user.
    pub async fn unfollow(&self, follower_address: &str, following_address: &str) -> AppResult<()> {
        if !self
            .follow_repo
            .delete_by_pair(follower_address, following_address)
            .await?
        {
            return Err(AppError::NotFound("Not following this user".to_string()));
        }

        tracing::info!(follower = %follower_address, following = %following_address, "Unfollowed user");
        Ok(())
    }

    /// Whether `follower_address` follows `following_address`.
    pub async fn is_following(
        &self,
        follower_address: &str,
        following_address: &str,
    ) -> AppResult<bool> {
        self.follow_repo
            .is_following(follower_address, following_address)
            .await
    }

    /// Users followed by `address`, most recently followed first, with counts.
    pub async fn list_following(&self, address: &str) -> AppResult<Vec<UserWithCounts>> {
        let addresses = self.follow_repo.following_addresses(address).await?;
        let users = self.user_repo.find_by_addresses(&addresses).await?;

        let ordered = addresses
            .iter()
            .filter_map(|a| users.iter().find(|u| &u.wallet_address == a).cloned())
            .collect();

        self.user_service.with_counts(ordered).await
    }

    /// Number of followers of `address`.
    pub async fn count_followers(&self, address: &str) -> AppResult<u64> {
        self.follow_repo.count_followers(address).await
    }

    /// Number of users `address` follows.
    pub async fn count_following(&self, address: &str) -> AppResult<u64> {
        self.follow_repo.count_following(address).await
    }
}
