//! Profile resolution.

use chainfeed_common::AppResult;
use chainfeed_db::{
    entities::user,
    repositories::{FollowRepository, UserRepository},
};
use serde::Serialize;

use crate::services::feed::{FeedPost, FeedQuery, FeedScope, FeedService, RelationSet, VisibilityPolicy};

/// Follow counts shown on a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    /// Users following the subject.
    pub followers: u64,
    /// Users the subject follows.
    pub following: u64,
}

/// A user's profile as seen by a viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    /// The subject.
    #[serde(flatten)]
    pub user: user::Model,

    /// Posts the viewer may see, newest first.
    pub posts: Vec<FeedPost>,

    /// Follow counts.
    #[serde(rename = "_count")]
    pub counts: FollowCounts,

    /// True when the viewer is the subject or follows the subject.
    pub is_following: bool,
}

/// Profile service.
#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    feed: FeedService,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, follow_repo: FollowRepository, feed: FeedService) -> Self {
        Self {
            user_repo,
            follow_repo,
            feed,
        }
    }

    /// Resolve `subject`'s profile for `viewer`.
    ///
    /// Followers (and the subject themself) see every post; everyone else
    /// sees public posts only.
    pub async fn resolve(&self, viewer: Option<&str>, subject: &str) -> AppResult<ProfileView> {
        let viewer = viewer.filter(|v| !v.is_empty());
        let user = self.user_repo.get_by_address(subject).await?;

        let is_following = match viewer {
            Some(viewer) if viewer == subject => true,
            Some(viewer) => self.follow_repo.is_following(viewer, subject).await?,
            None => false,
        };

        let visibility = if is_following {
            VisibilityPolicy::Owner
        } else {
            VisibilityPolicy::Public
        };
        let posts = self
            .feed
            .compose(
                FeedQuery::new(
                    FeedScope::Author(subject.to_string()),
                    visibility,
                    RelationSet::profile(),
                )
                .viewer(viewer),
            )
            .await?;

        let counts = FollowCounts {
            followers: self.follow_repo.count_followers(subject).await?,
            following: self.follow_repo.count_following(subject).await?,
        };

        Ok(ProfileView {
            user,
            posts,
            counts,
            is_following,
        })
    }
}
