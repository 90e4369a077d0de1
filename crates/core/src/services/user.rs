//! User service.

use std::collections::HashMap;

use chainfeed_common::{AppError, AppResult};
use chainfeed_db::{
    entities::user,
    repositories::{FollowRepository, PostRepository, ProfileChanges, UserRepository},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum number of users returned by a search.
pub const USER_SEARCH_LIMIT: u64 = 10;

/// A user as embedded in other responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    /// The user row.
    #[serde(flatten)]
    pub user: user::Model,

    /// Whether the viewer follows this user. Only present when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            user,
            is_following: None,
        }
    }
}

/// Aggregate counts for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    /// Posts written.
    pub posts: u64,
    /// Users following this user.
    pub followers: u64,
    /// Users this user follows.
    pub following: u64,
}

/// A user with post and follow counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithCounts {
    /// The user row.
    #[serde(flatten)]
    pub user: user::Model,

    /// Post and follow counts.
    #[serde(rename = "_count")]
    pub counts: UserCounts,
}

/// Input for creating or updating a profile.
///
/// Fields left out keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpsertProfileInput {
    /// Handle.
    #[validate(length(max = 64))]
    pub username: Option<String>,

    /// Name shown in the UI and in notification texts.
    #[validate(length(max = 128))]
    pub display_name: Option<String>,

    /// Free-form bio.
    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    /// Gender code, e.g. `FEMALE`.
    #[validate(length(max = 32))]
    pub gender: Option<String>,

    /// Avatar image URL.
    #[validate(length(max = 1024))]
    pub avatar_url: Option<String>,

    /// Photo URL used by the chat service.
    #[validate(length(max = 1024))]
    pub avatar_real_url: Option<String>,
}

impl From<UpsertProfileInput> for ProfileChanges {
    fn from(input: UpsertProfileInput) -> Self {
        Self {
            username: input.username,
            display_name: input.display_name,
            bio: input.bio,
            gender: input.gender,
            avatar_url: input.avatar_url,
            avatar_real_url: input.avatar_real_url,
        }
    }
}

/// Display name given to users created implicitly: `User` plus the first six
/// characters of the address.
#[must_use]
pub fn default_display_name(address: &str) -> String {
    let prefix: String = address.chars().take(6).collect();
    format!("User {prefix}")
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    post_repo: PostRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        follow_repo: FollowRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            user_repo,
            follow_repo,
            post_repo,
        }
    }

    /// Log in with a wallet address, creating the user on first login.
    ///
    /// No signature is checked; the address is taken at face value.
    pub async fn login(&self, wallet_address: &str) -> AppResult<user::Model> {
        let wallet_address = wallet_address.trim();
        if wallet_address.is_empty() {
            return Err(AppError::Validation(
                "Wallet address is required".to_string(),
            ));
        }

        let user = self
            .user_repo
            .ensure_exists(wallet_address, Some(default_display_name(wallet_address)))
            .await?;

        tracing::info!(address = %user.wallet_address, "User logged in");
        Ok(user)
    }

    /// Get a user by address.
    pub async fn get(&self, address: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_address(address).await
    }

    /// Create or update a profile.
    pub async fn upsert_profile(
        &self,
        address: &str,
        input: UpsertProfileInput,
    ) -> AppResult<user::Model> {
        if address.trim().is_empty() {
            return Err(AppError::Validation(
                "Wallet address is required".to_string(),
            ));
        }
        input.validate()?;

        let user = self.user_repo.upsert_profile(address, input.into()).await?;
        tracing::debug!(address = %user.wallet_address, "Profile saved");
        Ok(user)
    }

    /// Make sure a user row exists for an acting address.
    pub async fn ensure_user(&self, address: &str) -> AppResult<user::Model> {
        if address.trim().is_empty() {
            return Err(AppError::Validation("User address is required".to_string()));
        }
        self.user_repo
            .ensure_exists(address, Some(default_display_name(address)))
            .await
    }

    /// All users, newest first, with counts.
    pub async fn list_with_counts(&self) -> AppResult<Vec<UserWithCounts>> {
        let users = self.user_repo.find_all().await?;
        self.with_counts(users).await
    }

    /// Attach post, follower and following counts to a set of users.
    ///
    /// Counts are loaded with one grouped query each.
    pub async fn with_counts(&self, users: Vec<user::Model>) -> AppResult<Vec<UserWithCounts>> {
        let addresses: Vec<String> = users.iter().map(|u| u.wallet_address.clone()).collect();

        let posts = self.post_repo.count_by_authors(&addresses).await?;
        let followers = self.follow_repo.count_followers_for(&addresses).await?;
        let following = self.follow_repo.count_following_for(&addresses).await?;

        let lookup = |map: &HashMap<String, u64>, address: &str| map.get(address).copied().unwrap_or(0);

        Ok(users
            .into_iter()
            .map(|user| {
                let counts = UserCounts {
                    posts: lookup(&posts, &user.wallet_address),
                    followers: lookup(&followers, &user.wallet_address),
                    following: lookup(&following, &user.wallet_address),
                };
                UserWithCounts { user, counts }
            })
            .collect())
    }

    /// Users whose address, username or display name contains `query`.
    pub async fn search(&self, query: &str) -> AppResult<Vec<user::Model>> {
        self.user_repo.search(query, USER_SEARCH_LIMIT).await
    }
}
