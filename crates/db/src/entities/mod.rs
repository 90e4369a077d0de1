//! Database entities.

pub mod comment;
pub mod follow;
pub mod friend;
pub mod notification;
pub mod post;
pub mod post_collect;
pub mod post_like;
pub mod post_tag;
pub mod tag;
pub mod user;
pub mod user_file;

pub use comment::Entity as Comment;
pub use follow::Entity as Follow;
pub use friend::Entity as Friend;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use post_collect::Entity as PostCollect;
pub use post_like::Entity as PostLike;
pub use post_tag::Entity as PostTag;
pub use tag::Entity as Tag;
pub use user::Entity as User;
pub use user_file::Entity as UserFile;
