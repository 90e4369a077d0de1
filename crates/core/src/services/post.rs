//! Post service.

use std::collections::HashSet;

use chainfeed_common::{AppError, AppResult, IdGenerator};
use chainfeed_db::{
    entities::post,
    repositories::{FriendRepository, PostRepository, TagRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::feed::{FeedPost, FeedQuery, FeedScope, FeedService, RelationSet, VisibilityPolicy};

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    /// Wallet address of the author. Created on first post.
    #[validate(length(min = 1, max = 128))]
    pub author_address: String,

    /// Post body.
    #[validate(length(max = 10000))]
    pub content: String,

    /// Attached media URLs.
    #[serde(default)]
    #[validate(length(max = 16))]
    pub media_url: Vec<String>,

    /// Tag names. Blank names are dropped and duplicates collapsed.
    #[serde(default)]
    #[validate(length(max = 32))]
    pub tags: Vec<String>,

    /// On-chain transaction that recorded the post.
    #[validate(length(max = 256))]
    pub transaction_hash: Option<String>,

    /// Public when true; followers only otherwise.
    #[serde(default)]
    pub is_unfollow: bool,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    tag_repo: TagRepository,
    friend_repo: FriendRepository,
    feed: FeedService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        tag_repo: TagRepository,
        friend_repo: FriendRepository,
        feed: FeedService,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            tag_repo,
            friend_repo,
            feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post, creating its author and tags as needed.
    pub async fn create(&self, input: CreatePostInput) -> AppResult<FeedPost> {
        input.validate()?;

        self.user_repo
            .ensure_exists(&input.author_address, None)
            .await?;

        let now = Utc::now();
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_address: Set(input.author_address.clone()),
            content: Set(input.content),
            media_url: Set(serde_json::json!(input.media_url)),
            is_unfollow: Set(input.is_unfollow),
            transaction_hash: Set(input.transaction_hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let post = self.post_repo.create(model).await?;

        let mut seen = HashSet::new();
        for tag in input.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if seen.insert(tag) {
                self.tag_repo.attach(&post.id, tag).await?;
            }
        }

        tracing::info!(id = %post.id, author = %post.author_address, public = post.is_unfollow, "Created post");

        self.feed
            .compose(FeedQuery::new(
                FeedScope::Post(post.id.clone()),
                VisibilityPolicy::Owner,
                RelationSet::created(),
            ))
            .await?
            .pop()
            .ok_or(AppError::PostNotFound(post.id))
    }

    /// A single post as the viewer would see it in the home feed.
    pub async fn get(&self, id: &str, viewer: Option<&str>) -> AppResult<FeedPost> {
        self.feed
            .compose(
                FeedQuery::new(
                    FeedScope::Post(id.to_string()),
                    VisibilityPolicy::FollowersOnly,
                    RelationSet::home(),
                )
                .viewer(viewer),
            )
            .await?
            .pop()
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Home feed: public posts plus posts by followed authors.
    pub async fn home_feed(&self, viewer: Option<&str>) -> AppResult<Vec<FeedPost>> {
        self.feed
            .compose(
                FeedQuery::new(FeedScope::All, VisibilityPolicy::FollowersOnly, RelationSet::home())
                    .viewer(viewer),
            )
            .await
    }

    /// Posts by the user's friends.
    pub async fn friends_feed(&self, address: &str) -> AppResult<Vec<FeedPost>> {
        let friends = self.friend_repo.friend_addresses(address).await?;
        self.feed
            .compose(
                FeedQuery::new(
                    FeedScope::Authors(friends),
                    VisibilityPolicy::FollowersOnly,
                    RelationSet::friends(),
                )
                .viewer(Some(address)),
            )
            .await
    }

    /// Posts the user liked, flagged with whether the user follows each author.
    pub async fn liked_posts(&self, address: &str) -> AppResult<Vec<FeedPost>> {
        self.feed
            .compose(
                FeedQuery::new(
                    FeedScope::LikedBy(address.to_string()),
                    VisibilityPolicy::Owner,
                    RelationSet::liked(),
                )
                .viewer(Some(address)),
            )
            .await
    }

    /// Posts the user collected.
    pub async fn collected_posts(&self, address: &str) -> AppResult<Vec<FeedPost>> {
        self.feed
            .compose(
                FeedQuery::new(
                    FeedScope::CollectedBy(address.to_string()),
                    VisibilityPolicy::Owner,
                    RelationSet::collected(),
                )
                .viewer(Some(address)),
            )
            .await
    }

    /// The user's own posts.
    pub async fn my_posts(&self, address: &str) -> AppResult<Vec<FeedPost>> {
        self.feed
            .compose(
                FeedQuery::new(
                    FeedScope::Author(address.to_string()),
                    VisibilityPolicy::Owner,
                    RelationSet::mine(),
                )
                .viewer(Some(address)),
            )
            .await
    }
}
