//! Application state.

use std::sync::Arc;

use chainfeed_common::{AppResult, Config, LocalStorage, StorageBackend};
use chainfeed_core::{
    ChatService, DispatcherService, FeedService, FollowingService, FriendService,
    InteractionService, MessagingService, NotificationService, PostService, ProfileService,
    SearchService, UserFileService, UserService,
};
use chainfeed_db::repositories::{
    CommentRepository, FollowRepository, FriendRepository, NotificationRepository,
    PostCollectRepository, PostLikeRepository, PostRepository, TagRepository, UserFileRepository,
    UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Users and profiles.
    pub user_service: UserService,
    /// Follow edges.
    pub following_service: FollowingService,
    /// Friendships.
    pub friend_service: FriendService,
    /// Posts and feeds.
    pub post_service: PostService,
    /// Likes, collects and comments.
    pub interaction_service: InteractionService,
    /// Notification store.
    pub notification_service: NotificationService,
    /// Profile views.
    pub profile_service: ProfileService,
    /// User and post search.
    pub search_service: SearchService,
    /// Direct messages.
    pub messaging_service: MessagingService,
    /// File metadata.
    pub user_file_service: UserFileService,
    /// Chat proxy.
    pub chat_service: ChatService,
    /// Upload storage.
    pub storage: Arc<dyn StorageBackend>,
}

impl AppState {
    /// Wire every service against one database handle.
    ///
    /// `dispatcher` receives the notifications triggered by follows, likes
    /// and comments. Messages bypass it and are written inline.
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: &Config,
        dispatcher: DispatcherService,
    ) -> AppResult<Self> {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(Arc::clone(&db));
        let friend_repo = FriendRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let like_repo = PostLikeRepository::new(Arc::clone(&db));
        let collect_repo = PostCollectRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let tag_repo = TagRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));
        let user_file_repo = UserFileRepository::new(db);

        let user_service =
            UserService::new(user_repo.clone(), follow_repo.clone(), post_repo.clone());
        let notification_service = NotificationService::new(notification_repo, user_repo.clone());
        let feed = FeedService::new(
            post_repo.clone(),
            user_repo.clone(),
            follow_repo.clone(),
            like_repo.clone(),
            collect_repo.clone(),
            comment_repo.clone(),
            tag_repo.clone(),
        );

        let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
            config.storage.upload_dir.clone(),
            config.storage.public_path.clone(),
        ));

        Ok(Self {
            following_service: FollowingService::new(
                follow_repo.clone(),
                user_repo.clone(),
                user_service.clone(),
                dispatcher.clone(),
            ),
            friend_service: FriendService::new(
                friend_repo.clone(),
                user_repo.clone(),
                user_service.clone(),
            ),
            post_service: PostService::new(
                post_repo.clone(),
                user_repo.clone(),
                tag_repo,
                friend_repo,
                feed.clone(),
            ),
            interaction_service: InteractionService::new(
                post_repo,
                user_repo.clone(),
                like_repo,
                collect_repo,
                comment_repo,
                dispatcher,
            ),
            profile_service: ProfileService::new(user_repo.clone(), follow_repo, feed.clone()),
            search_service: SearchService::new(user_service.clone(), feed),
            messaging_service: MessagingService::new(
                user_repo.clone(),
                notification_service.clone(),
            ),
            user_file_service: UserFileService::new(user_file_repo, user_repo.clone()),
            chat_service: ChatService::new(user_repo, config)?,
            notification_service,
            user_service,
            storage,
        })
    }
}
