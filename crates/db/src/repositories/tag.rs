//! Tag repository.

use std::sync::Arc;

use crate::entities::{PostTag, Tag, post_tag, tag};
use crate::write_err;
use chainfeed_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tag by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<tag::Model>> {
        Tag::find_by_id(name)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get or create a tag.
    pub async fn get_or_create(&self, name: &str) -> AppResult<tag::Model> {
        if let Some(tag) = self.find_by_name(name).await? {
            return Ok(tag);
        }

        let model = tag::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await.map_err(|e| write_err(e, "Tag")) {
            Ok(created) => Ok(created),
            // Created concurrently by another post.
            Err(AppError::Conflict(_)) => self
                .find_by_name(name)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Tag: {name}"))),
            Err(e) => Err(e),
        }
    }

    /// Attach a tag to a post, creating the tag if needed.
    pub async fn attach(&self, post_id: &str, name: &str) -> AppResult<()> {
        let tag = self.get_or_create(name).await?;

        let link = post_tag::ActiveModel {
            post_id: Set(post_id.to_string()),
            tag_name: Set(tag.name),
        };

        let inserted = PostTag::insert(link)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Post tag"));

        match inserted {
            // The same tag listed twice on one post.
            Ok(_) | Err(AppError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Tag links for any of the given posts, ordered by tag name.
    pub async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<post_tag::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        PostTag::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().cloned()))
            .order_by_asc(post_tag::Column::TagName)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_get_or_create_existing() {
        let tag = tag::Model {
            name: "web3".to_string(),
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[tag]])
            .into_connection();

        let repo = TagRepository::new(Arc::new(db));
        let found = repo.get_or_create("web3").await.unwrap();

        assert_eq!(found.name, "web3");
    }

    #[tokio::test]
    async fn test_find_by_posts() {
        let links = vec![
            post_tag::Model {
                post_id: "p1".to_string(),
                tag_name: "art".to_string(),
            },
            post_tag::Model {
                post_id: "p1".to_string(),
                tag_name: "nft".to_string(),
            },
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([links])
            .into_connection();

        let repo = TagRepository::new(Arc::new(db));
        let found = repo.find_by_posts(&["p1".to_string()]).await.unwrap();

        assert_eq!(found.len(), 2);
    }
}
