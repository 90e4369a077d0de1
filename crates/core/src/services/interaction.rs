//! Likes, collects and comments on posts.

use std::collections::HashMap;

use chainfeed_common::{AppError, AppResult, IdGenerator};
use chainfeed_db::{
    entities::{comment, notification::NotificationType, post_collect, post_like, user},
    repositories::{
        CommentRepository, PostCollectRepository, PostLikeRepository, PostRepository,
        UserRepository,
    },
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::dispatch::{DispatcherService, PendingNotification};
use crate::services::feed::CommentView;
use crate::services::user::default_display_name;

/// Input for creating a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentInput {
    /// Wallet address of the commenter.
    #[validate(length(min = 1, max = 128))]
    pub author_address: String,

    /// Comment body.
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Interaction service for business logic.
#[derive(Clone)]
pub struct InteractionService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    like_repo: PostLikeRepository,
    collect_repo: PostCollectRepository,
    comment_repo: CommentRepository,
    dispatcher: DispatcherService,
    id_gen: IdGenerator,
}

impl InteractionService {
    /// Create a new interaction service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        like_repo: PostLikeRepository,
        collect_repo: PostCollectRepository,
        comment_repo: CommentRepository,
        dispatcher: DispatcherService,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            like_repo,
            collect_repo,
            comment_repo,
            dispatcher,
            id_gen: IdGenerator::new(),
        }
    }

    async fn ensure_actor(&self, address: &str) -> AppResult<user::Model> {
        if address.trim().is_empty() {
            return Err(AppError::Validation("User address is required".to_string()));
        }
        self.user_repo
            .ensure_exists(address, Some(default_display_name(address)))
            .await
    }

    /// Like a post. Liking twice is a `Conflict`.
    pub async fn like(
        &self,
        post_id: &str,
        user_address: &str,
        transaction_hash: Option<String>,
    ) -> AppResult<post_like::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.ensure_actor(user_address).await?;

        let model = post_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            user_address: Set(user_address.to_string()),
            transaction_hash: Set(transaction_hash),
            created_at: Set(Utc::now().into()),
        };
        let like = self.like_repo.create(model).await?;

        tracing::debug!(post = %post_id, user = %user_address, "Liked post");

        self.dispatcher
            .dispatch(
                PendingNotification::new(NotificationType::Like, post.author_address, user_address)
                    .with_post(post_id),
            )
            .await;

        Ok(like)
    }

    /// Remove a like.
    pub async fn unlike(&self, post_id: &str, user_address: &str) -> AppResult<()> {
        if !self.like_repo.delete_by_pair(post_id, user_address).await? {
            return Err(AppError::NotFound("Like not found".to_string()));
        }
        tracing::debug!(post = %post_id, user = %user_address, "Unliked post");
        Ok(())
    }

    /// Collect a post. Collecting twice is a `Conflict`. No notification is
    /// sent.
    pub async fn collect(
        &self,
        post_id: &str,
        user_address: &str,
        transaction_hash: Option<String>,
    ) -> AppResult<post_collect::Model> {
        self.post_repo.get_by_id(post_id).await?;
        self.ensure_actor(user_address).await?;

        let model = post_collect::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            user_address: Set(user_address.to_string()),
            transaction_hash: Set(transaction_hash),
            created_at: Set(Utc::now().into()),
        };
        let collect = self.collect_repo.create(model).await?;

        tracing::debug!(post = %post_id, user = %user_address, "Collected post");
        Ok(collect)
    }

    /// Remove a collect.
    pub async fn uncollect(&self, post_id: &str, user_address: &str) -> AppResult<()> {
        if !self
            .collect_repo
            .delete_by_pair(post_id, user_address)
            .await?
        {
            return Err(AppError::NotFound("Collect not found".to_string()));
        }
        tracing::debug!(post = %post_id, user = %user_address, "Uncollected post");
        Ok(())
    }

    /// Comment on a post and notify its author.
    pub async fn comment(&self, post_id: &str, input: CreateCommentInput) -> AppResult<CommentView> {
        input.validate()?;
        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Comment content is required".to_string()));
        }

        let post = self.post_repo.get_by_id(post_id).await?;
        let author = self.ensure_actor(&input.author_address).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            author_address: Set(input.author_address.clone()),
            content: Set(input.content),
            created_at: Set(Utc::now().into()),
        };
        let comment = self.comment_repo.create(model).await?;

        tracing::debug!(id = %comment.id, post = %post_id, "Created comment");

        self.dispatcher
            .dispatch(
                PendingNotification::new(
                    NotificationType::Comment,
                    post.author_address,
                    &input.author_address,
                )
                .with_text(comment.content.clone())
                .with_post(post_id)
                .with_comment(comment.id.clone()),
            )
            .await;

        Ok(CommentView::new(comment, Some(&author)))
    }

    /// Comments on a post, newest first, with their authors.
    pub async fn list_comments(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;

        let mut addresses: Vec<String> = comments.iter().map(|c| c.author_address.clone()).collect();
        addresses.sort();
        addresses.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_addresses(&addresses)
            .await?
            .into_iter()
            .map(|u| (u.wallet_address.clone(), u))
            .collect();

        Ok(comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.author_address);
                CommentView::new(c, author)
            })
            .collect())
    }
}
