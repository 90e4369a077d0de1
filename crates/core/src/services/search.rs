//! Search over users and posts.

use chainfeed_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::services::feed::{
    FeedPost, FeedQuery, FeedScope, FeedService, POST_SEARCH_LIMIT, RelationSet, VisibilityPolicy,
};
use crate::services::user::{UserService, UserWithCounts};

/// What to search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Users and posts.
    #[default]
    All,
    /// Users only.
    Users,
    /// Posts only.
    Posts,
}

impl SearchType {
    const fn users(self) -> bool {
        matches!(self, Self::All | Self::Users)
    }

    const fn posts(self) -> bool {
        matches!(self, Self::All | Self::Posts)
    }
}

/// Search results. A section not searched is empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    /// Matching users.
    pub users: Vec<UserWithCounts>,
    /// Matching posts.
    pub posts: Vec<FeedPost>,
}

/// Search service.
#[derive(Clone)]
pub struct SearchService {
    user_service: UserService,
    feed: FeedService,
}

impl SearchService {
    /// Create a new search service.
    #[must_use]
    pub const fn new(user_service: UserService, feed: FeedService) -> Self {
        Self { user_service, feed }
    }

    /// Case-insensitive substring search.
    ///
    /// Users match on address, username or display name; posts match on
    /// content or tag name and are filtered for the viewer like the home feed.
    pub async fn search(
        &self,
        query: &str,
        search_type: SearchType,
        viewer: Option<&str>,
    ) -> AppResult<SearchResults> {
        let query = query.trim();
        let mut results = SearchResults::default();

        if search_type.users() {
            let users = self.user_service.search(query).await?;
            results.users = self.user_service.with_counts(users).await?;
        }

        if search_type.posts() {
            results.posts = self
                .feed
                .compose(
                    FeedQuery::new(
                        FeedScope::Search(query.to_string()),
                        VisibilityPolicy::FollowersOnly,
                        RelationSet::search(),
                    )
                    .viewer(viewer)
                    .limit(POST_SEARCH_LIMIT),
                )
                .await?;
        }

        tracing::debug!(
            query = %query,
            users = results.users.len(),
            posts = results.posts.len(),
            "Search completed"
        );
        Ok(results)
    }
}
