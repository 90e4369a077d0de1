//! Database repositories.

use sea_orm::sea_query::LikeExpr;

pub mod comment;
pub mod follow;
pub mod friend;
pub mod notification;
pub mod post;
pub mod post_collect;
pub mod post_like;
pub mod tag;
pub mod user;
pub mod user_file;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use friend::FriendRepository;
pub use notification::NotificationRepository;
pub use post::{PostFilter, PostRepository, VisibilityFilter};
pub use post_collect::PostCollectRepository;
pub use post_like::PostLikeRepository;
pub use tag::TagRepository;
pub use user::{ProfileChanges, UserRepository};
pub use user_file::UserFileRepository;

/// Escape `LIKE` wildcards so `text` matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive `LIKE` pattern that matches `text` literally anywhere.
///
/// Compare it against a lowercased column.
pub(crate) fn contains_pattern(text: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(&text.to_lowercase()))).escape('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like(r"50%_off\now"), r"50\%\_off\\now");
    }
}
