//! Feed composition.
//!
//! Every post listing goes through [`FeedService::compose`]: a scope picks
//! candidate posts, a visibility policy filters them for the viewer, and a
//! relation set decides what each post is decorated with. Relations are
//! loaded once per page, never per post.

use std::collections::{HashMap, HashSet};

use chainfeed_common::AppResult;
use chainfeed_db::{
    entities::{comment, post, user},
    repositories::{
        CommentRepository, FollowRepository, PostCollectRepository, PostFilter,
        PostLikeRepository, PostRepository, TagRepository, UserRepository, VisibilityFilter,
    },
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

use crate::services::user::UserSummary;

/// Maximum number of posts returned by a search.
pub const POST_SEARCH_LIMIT: u64 = 20;

/// Number of comments shown on owner listings.
pub const LATEST_COMMENTS: usize = 3;

/// Which posts are candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// Every post.
    All,
    /// A single post by id.
    Post(String),
    /// Posts by one author.
    Author(String),
    /// Posts by any of these authors.
    Authors(Vec<String>),
    /// Posts the user has liked.
    LikedBy(String),
    /// Posts the user has collected.
    CollectedBy(String),
    /// Content or a tag name contains the text, case-insensitively.
    Search(String),
}

/// Which candidates the viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPolicy {
    /// Public posts only.
    Public,
    /// Public posts, plus posts by authors the viewer follows and the
    /// viewer's own posts. Without a viewer only public posts pass.
    FollowersOnly,
    /// No filtering; used for listings the viewer owns.
    Owner,
}

/// How comments are attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentInclusion {
    /// No comments.
    None,
    /// Comment ids only.
    Ids,
    /// The newest `n` comments, without authors.
    Latest(usize),
    /// Every comment, oldest first, with its author.
    All,
}

/// What each post is decorated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSet {
    /// Embed the author.
    pub author: bool,
    /// List who liked the post.
    pub likes: bool,
    /// List who collected the post.
    pub collects: bool,
    /// Comment detail.
    pub comments: CommentInclusion,
    /// List the post's tags.
    pub tags: bool,
    /// Like and comment counts.
    pub counts: bool,
    /// Mark whether the viewer follows each post's author. Authors are
    /// always followed by themselves.
    pub is_following: bool,
}

impl RelationSet {
    /// Nothing but the post itself.
    pub const NONE: Self = Self {
        author: false,
        likes: false,
        collects: false,
        comments: CommentInclusion::None,
        tags: false,
        counts: false,
        is_following: false,
    };

    /// Home feed and single post.
    #[must_use]
    pub const fn home() -> Self {
        Self {
            author: true,
            likes: true,
            comments: CommentInclusion::All,
            tags: true,
            ..Self::NONE
        }
    }

    /// Search results.
    #[must_use]
    pub const fn search() -> Self {
        Self {
            author: true,
            likes: true,
            comments: CommentInclusion::Ids,
            tags: true,
            ..Self::NONE
        }
    }

    /// Posts embedded in a profile.
    #[must_use]
    pub const fn profile() -> Self {
        Self {
            likes: true,
            comments: CommentInclusion::All,
            tags: true,
            ..Self::NONE
        }
    }

    /// Friends feed.
    #[must_use]
    pub const fn friends() -> Self {
        Self {
            author: true,
            likes: true,
            collects: true,
            comments: CommentInclusion::All,
            ..Self::NONE
        }
    }

    /// Posts a user liked.
    #[must_use]
    pub const fn liked() -> Self {
        Self {
            is_following: true,
            ..Self::collected()
        }
    }

    /// Posts a user collected.
    #[must_use]
    pub const fn collected() -> Self {
        Self {
            author: true,
            likes: true,
            collects: true,
            comments: CommentInclusion::Latest(LATEST_COMMENTS),
            tags: true,
            counts: true,
            is_following: false,
        }
    }

    /// A user's own posts.
    #[must_use]
    pub const fn mine() -> Self {
        Self {
            author: true,
            likes: true,
            collects: true,
            comments: CommentInclusion::Ids,
            is_following: true,
            ..Self::NONE
        }
    }

    /// Freshly created post.
    #[must_use]
    pub const fn created() -> Self {
        Self {
            author: true,
            tags: true,
            ..Self::NONE
        }
    }

    const fn needs_likes(&self) -> bool {
        self.likes || self.counts
    }

    const fn needs_comments(&self) -> bool {
        self.counts || !matches!(self.comments, CommentInclusion::None)
    }
}

/// A feed request.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    /// Wallet address of the viewer, if known.
    pub viewer: Option<String>,
    /// Candidate posts.
    pub scope: FeedScope,
    /// Visibility filter applied to the candidates.
    pub visibility: VisibilityPolicy,
    /// Decoration for each post.
    pub relations: RelationSet,
    /// Maximum number of posts.
    pub limit: Option<u64>,
}

impl FeedQuery {
    /// An anonymous, unlimited query.
    #[must_use]
    pub fn new(scope: FeedScope, visibility: VisibilityPolicy, relations: RelationSet) -> Self {
        Self {
            viewer: None,
            scope,
            visibility,
            relations,
            limit: None,
        }
    }

    /// Set the viewer. An empty address counts as no viewer.
    #[must_use]
    pub fn viewer(mut self, viewer: Option<impl Into<String>>) -> Self {
        self.viewer = viewer.map(Into::into).filter(|v: &String| !v.is_empty());
        self
    }

    /// Cap the number of posts.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A user reference on a like or collect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    /// Wallet address of the user.
    pub user_address: String,
}

/// A tag reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRef {
    /// Tag name as stored.
    pub tag_name: String,
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommentEntry {
    /// Comment id only.
    Id { id: String },
    /// Full comment.
    Full(CommentView),
}

/// A comment with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    /// Comment id.
    pub id: String,
    /// Post the comment belongs to.
    pub post_id: String,
    /// Comment body.
    pub content: String,
    /// Wallet address of the commenter.
    pub author_address: String,
    /// When the comment was written.
    pub created_at: DateTimeWithTimeZone,
    /// The commenter, when the user row exists.
    pub author: Option<UserSummary>,
}

impl CommentView {
    /// Pair a comment with its author.
    #[must_use]
    pub fn new(comment: comment::Model, author: Option<&user::Model>) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            author_address: comment.author_address,
            created_at: comment.created_at,
            author: author.cloned().map(UserSummary::from),
        }
    }
}

/// Per-post counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostCounts {
    /// Number of likes.
    pub likes: u64,
    /// Number of comments.
    pub comments: u64,
}

/// A post decorated for a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedPost {
    /// The post row.
    #[serde(flatten)]
    pub post: post::Model,

    /// Post author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<UserSummary>,

    /// Users who liked the post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<UserRef>>,

    /// Users who collected the post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collects: Option<Vec<UserRef>>,

    /// Attached comments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentEntry>>,

    /// Tags on the post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagRef>>,

    /// Like and comment counts.
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub counts: Option<PostCounts>,
}

/// Feed composer.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    like_repo: PostLikeRepository,
    collect_repo: PostCollectRepository,
    comment_repo: CommentRepository,
    tag_repo: TagRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        follow_repo: FollowRepository,
        like_repo: PostLikeRepository,
        collect_repo: PostCollectRepository,
        comment_repo: CommentRepository,
        tag_repo: TagRepository,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            follow_repo,
            like_repo,
            collect_repo,
            comment_repo,
            tag_repo,
        }
    }

    /// Select, filter and decorate a page of posts, newest first.
    pub async fn compose(&self, query: FeedQuery) -> AppResult<Vec<FeedPost>> {
        let FeedQuery {
            viewer,
            scope,
            visibility,
            relations,
            limit,
        } = query;

        // Fetched once, used for both the visibility filter and the flags.
        let needs_following = viewer.is_some()
            && (visibility == VisibilityPolicy::FollowersOnly || relations.is_following);
        let following: HashSet<String> = match &viewer {
            Some(viewer) if needs_following => self
                .follow_repo
                .following_addresses(viewer)
                .await?
                .into_iter()
                .collect(),
            _ => HashSet::new(),
        };

        let mut filter = self.scope_filter(scope).await?;
        filter.visibility = match (visibility, &viewer) {
            (VisibilityPolicy::Owner, _) => VisibilityFilter::Any,
            (VisibilityPolicy::Public, _) | (VisibilityPolicy::FollowersOnly, None) => {
                VisibilityFilter::PublicOnly
            }
            (VisibilityPolicy::FollowersOnly, Some(viewer)) => {
                let mut authors: Vec<String> = following.iter().cloned().collect();
                authors.push(viewer.clone());
                VisibilityFilter::PublicOrAuthors(authors)
            }
        };

        let posts = self.post_repo.find_filtered(&filter, limit).await?;
        tracing::debug!(count = posts.len(), ?visibility, "Composed feed page");

        self.decorate(posts, relations, viewer.as_deref(), &following)
            .await
    }

    async fn scope_filter(&self, scope: FeedScope) -> AppResult<PostFilter> {
        let filter = match scope {
            FeedScope::All => PostFilter::default(),
            FeedScope::Post(id) => PostFilter {
                ids: Some(vec![id]),
                ..PostFilter::default()
            },
            FeedScope::Author(author) => PostFilter {
                authors: Some(vec![author]),
                ..PostFilter::default()
            },
            FeedScope::Authors(authors) => PostFilter {
                authors: Some(authors),
                ..PostFilter::default()
            },
            FeedScope::LikedBy(user) => PostFilter {
                ids: Some(self.like_repo.post_ids_by_user(&user).await?),
                ..PostFilter::default()
            },
            FeedScope::CollectedBy(user) => PostFilter {
                ids: Some(self.collect_repo.post_ids_by_user(&user).await?),
                ..PostFilter::default()
            },
            FeedScope::Search(text) => PostFilter {
                text: Some(text),
                ..PostFilter::default()
            },
        };
        Ok(filter)
    }

    async fn decorate(
        &self,
        posts: Vec<post::Model>,
        relations: RelationSet,
        viewer: Option<&str>,
        following: &HashSet<String>,
    ) -> AppResult<Vec<FeedPost>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();

        let likes = if relations.needs_likes() {
            PostLikeRepository::group_by_post(self.like_repo.find_by_posts(&post_ids).await?)
        } else {
            HashMap::new()
        };

        let collects = if relations.collects {
            PostCollectRepository::group_by_post(
                self.collect_repo.find_by_posts(&post_ids).await?,
            )
        } else {
            HashMap::new()
        };

        let mut comments: HashMap<String, Vec<comment::Model>> = HashMap::new();
        if relations.needs_comments() {
            for comment in self.comment_repo.find_by_posts(&post_ids).await? {
                comments.entry(comment.post_id.clone()).or_default().push(comment);
            }
        }

        let mut tags: HashMap<String, Vec<TagRef>> = HashMap::new();
        if relations.tags {
            for row in self.tag_repo.find_by_posts(&post_ids).await? {
                tags.entry(row.post_id).or_default().push(TagRef {
                    tag_name: row.tag_name,
                });
            }
        }

        // Post authors and full-comment authors in one lookup.
        let mut addresses: HashSet<String> = HashSet::new();
        if relations.author {
            addresses.extend(posts.iter().map(|p| p.author_address.clone()));
        }
        if matches!(
            relations.comments,
            CommentInclusion::All | CommentInclusion::Latest(_)
        ) {
            addresses.extend(
                comments
                    .values()
                    .flatten()
                    .map(|c| c.author_address.clone()),
            );
        }
        let addresses: Vec<String> = addresses.into_iter().collect();
        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_addresses(&addresses)
            .await?
            .into_iter()
            .map(|u| (u.wallet_address.clone(), u))
            .collect();

        let follows = |author: &str| viewer == Some(author) || following.contains(author);

        Ok(posts
            .into_iter()
            .map(|post| {
                let post_likes = likes.get(&post.id).map(Vec::as_slice).unwrap_or_default();
                let post_comments = comments.get(&post.id).map(Vec::as_slice).unwrap_or_default();

                let author = relations
                    .author
                    .then(|| users.get(&post.author_address))
                    .flatten()
                    .map(|u| UserSummary {
                        user: u.clone(),
                        is_following: relations
                            .is_following
                            .then(|| follows(&post.author_address)),
                    });

                let counts = relations.counts.then(|| PostCounts {
                    likes: post_likes.len() as u64,
                    comments: post_comments.len() as u64,
                });

                FeedPost {
                    author,
                    likes: relations.likes.then(|| user_refs(post_likes.iter().map(|l| &l.user_address))),
                    collects: relations.collects.then(|| {
                        user_refs(
                            collects
                                .get(&post.id)
                                .into_iter()
                                .flatten()
                                .map(|c| &c.user_address),
                        )
                    }),
                    comments: comment_entries(relations.comments, post_comments, &users),
                    tags: relations
                        .tags
                        .then(|| tags.get(&post.id).cloned().unwrap_or_default()),
                    counts,
                    post,
                }
            })
            .collect())
    }
}

fn user_refs<'a>(addresses: impl Iterator<Item = &'a String>) -> Vec<UserRef> {
    addresses
        .map(|a| UserRef {
            user_address: a.clone(),
        })
        .collect()
}

/// Comments arrive newest first.
fn comment_entries(
    inclusion: CommentInclusion,
    comments: &[comment::Model],
    users: &HashMap<String, user::Model>,
) -> Option<Vec<CommentEntry>> {
    let full = |c: &comment::Model| {
        CommentEntry::Full(CommentView::new(c.clone(), users.get(&c.author_address)))
    };

    match inclusion {
        CommentInclusion::None => None,
        CommentInclusion::Ids => Some(
            comments
                .iter()
                .map(|c| CommentEntry::Id { id: c.id.clone() })
                .collect(),
        ),
        CommentInclusion::Latest(n) => Some(comments.iter().take(n).map(full).collect()),
        CommentInclusion::All => Some(comments.iter().map(full).collect()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            author_address: "0xa".to_string(),
            content: format!("comment {id}"),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_presets() {
        assert_eq!(RelationSet::home().comments, CommentInclusion::All);
        assert!(!RelationSet::home().collects);
        assert_eq!(RelationSet::search().comments, CommentInclusion::Ids);
        assert!(!RelationSet::profile().author);
        assert!(RelationSet::liked().is_following);
        assert!(!RelationSet::collected().is_following);
        assert_eq!(
            RelationSet::collected().comments,
            CommentInclusion::Latest(LATEST_COMMENTS)
        );
        assert!(RelationSet::mine().is_following);
    }

    #[test]
    fn test_comment_entries_latest_truncates() {
        let comments = vec![comment("c3"), comment("c2"), comment("c1")];
        let entries =
            comment_entries(CommentInclusion::Latest(2), &comments, &HashMap::new()).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], CommentEntry::Full(c) if c.id == "c3"));
    }

    #[test]
    fn test_comment_entries_ids_serialize_as_objects() {
        let comments = vec![comment("c1")];
        let entries = comment_entries(CommentInclusion::Ids, &comments, &HashMap::new()).unwrap();

        let value = serde_json::to_value(entries).unwrap();
        assert_eq!(value, serde_json::json!([{ "id": "c1" }]));
    }

    #[test]
    fn test_comment_entries_none() {
        assert!(comment_entries(CommentInclusion::None, &[comment("c1")], &HashMap::new()).is_none());
    }

    #[test]
    fn test_viewer_ignores_empty_address() {
        let query = FeedQuery::new(FeedScope::All, VisibilityPolicy::FollowersOnly, RelationSet::home())
            .viewer(Some(""));
        assert!(query.viewer.is_none());
    }
}
