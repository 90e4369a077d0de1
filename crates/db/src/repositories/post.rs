//! Post repository.

use std::collections::HashMap;
use std::sync::Arc;

use super::contains_pattern;
use crate::entities::{Post, PostTag, post, post_tag};
use chainfeed_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Func, Query},
};

/// Candidate selection for a page of posts.
///
/// Every populated field narrows the result; an empty filter selects all
/// posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Only posts written by one of these authors.
    pub authors: Option<Vec<String>>,
    /// Only posts with one of these ids.
    pub ids: Option<Vec<String>>,
    /// Only posts whose content or a tag name contains this text,
    /// case-insensitively.
    pub text: Option<String>,
    /// Visibility restriction applied on top of the selection.
    pub visibility: VisibilityFilter,
}

/// Visibility restriction on `is_unfollow`.
#[derive(Debug, Clone, Default)]
pub enum VisibilityFilter {
    /// No restriction.
    #[default]
    Any,
    /// Only public posts.
    PublicOnly,
    /// Public posts, plus non-public posts by one of these authors.
    PublicOrAuthors(Vec<String>),
}

impl PostFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(authors) = &self.authors {
            condition = condition.add(post::Column::AuthorAddress.is_in(authors.iter().cloned()));
        }

        if let Some(ids) = &self.ids {
            condition = condition.add(post::Column::Id.is_in(ids.iter().cloned()));
        }

        if let Some(text) = &self.text {
            let pattern = contains_pattern(text);
            let tagged = Query::select()
                .column(post_tag::Column::PostId)
                .from(PostTag)
                .and_where(
                    Expr::expr(Func::lower(Expr::col(post_tag::Column::TagName)))
                        .like(pattern.clone()),
                )
                .to_owned();

            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((Post, post::Column::Content))))
                            .like(pattern),
                    )
                    .add(post::Column::Id.in_subquery(tagged)),
            );
        }

        match &self.visibility {
            VisibilityFilter::Any => {}
            VisibilityFilter::PublicOnly => {
                condition = condition.add(post::Column::IsUnfollow.eq(true));
            }
            VisibilityFilter::PublicOrAuthors(authors) => {
                condition = condition.add(
                    Condition::any()
                        .add(post::Column::IsUnfollow.eq(true))
                        .add(post::Column::AuthorAddress.is_in(authors.iter().cloned())),
                );
            }
        }

        condition
    }

    /// True when the filter can match nothing, so the query can be skipped.
    fn is_empty_selection(&self) -> bool {
        self.authors.as_ref().is_some_and(Vec::is_empty)
            || self.ids.as_ref().is_some_and(Vec::is_empty)
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find posts matching a filter, newest first.
    pub async fn find_filtered(
        &self,
        filter: &PostFilter,
        limit: Option<u64>,
    ) -> AppResult<Vec<post::Model>> {
        if filter.is_empty_selection() {
            return Ok(vec![]);
        }

        let mut query = Post::find()
            .filter(filter.condition())
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Post counts for several authors in one query.
    pub async fn count_by_authors(&self, authors: &[String]) -> AppResult<HashMap<String, u64>> {
        if authors.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Post::find()
            .select_only()
            .column(post::Column::AuthorAddress)
            .column_as(Expr::col(post::Column::Id).count(), "count")
            .filter(post::Column::AuthorAddress.is_in(authors.iter().cloned()))
            .group_by(post::Column::AuthorAddress)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(author, count)| (author, count as u64))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    fn create_test_post(id: &str, author: &str, is_unfollow: bool) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_address: author.to_string(),
            content: "gm".to_string(),
            media_url: serde_json::json!(["/api/static/1-a.png"]),
            is_unfollow,
            transaction_hash: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let repo = PostRepository::new(Arc::new(db));
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_filtered_returns_rows() {
        let posts = vec![
            create_test_post("p2", "0xa", true),
            create_test_post("p1", "0xb", false),
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([posts])
            .into_connection();

        let repo = PostRepository::new(Arc::new(db));
        let found = repo
            .find_filtered(&PostFilter::default(), Some(20))
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].media_urls(), vec!["/api/static/1-a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_find_filtered_empty_author_set_skips_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PostRepository::new(Arc::new(db));

        let filter = PostFilter {
            authors: Some(vec![]),
            ..PostFilter::default()
        };
        assert!(repo.find_filtered(&filter, None).await.unwrap().is_empty());
    }

    #[test]
    fn test_public_or_authors_condition_sql() {
        let filter = PostFilter {
            visibility: VisibilityFilter::PublicOrAuthors(vec!["0xa".to_string()]),
            ..PostFilter::default()
        };
        let sql = Post::find()
            .filter(filter.condition())
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""is_unfollow" = TRUE"#));
        assert!(sql.contains(" OR "));
        assert!(sql.contains(r#""author_address" IN ('0xa')"#));
    }
}
