//! Business logic services.

pub mod chat;
pub mod dispatch;
pub mod feed;
pub mod following;
pub mod friend;
pub mod interaction;
pub mod messaging;
pub mod notification;
pub mod post;
pub mod profile;
pub mod search;
pub mod user;
pub mod user_file;

pub use chat::{ChatInput, ChatService};
pub use dispatch::{
    DispatchWorker, DispatcherService, InlineDispatcher, NoOpDispatcher, NotificationDispatcher,
    PendingNotification, QueuedDispatcher,
};
pub use feed::{
    CommentEntry, CommentInclusion, CommentView, FeedPost, FeedQuery, FeedScope, FeedService,
    PostCounts, RelationSet, TagRef, UserRef, VisibilityPolicy,
};
pub use following::FollowingService;
pub use friend::FriendService;
pub use interaction::{CreateCommentInput, InteractionService};
pub use messaging::{MessagingService, SendMessageInput};
pub use notification::{
    NotificationPage, NotificationService, NotificationView, format_notification_text,
};
pub use post::{CreatePostInput, PostService};
pub use profile::{FollowCounts, ProfileService, ProfileView};
pub use search::{SearchResults, SearchService, SearchType};
pub use user::{UpsertProfileInput, UserCounts, UserService, UserSummary, UserWithCounts};
pub use user_file::{CreateUserFileInput, UserFileService};
