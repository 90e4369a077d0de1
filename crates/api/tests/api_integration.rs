//! API integration tests.
//!
//! The router runs against an in-memory database with notifications
//! dispatched inline, so every effect is visible to the next request.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chainfeed_api::{AppState, router as api_router};
use chainfeed_common::config::{
    ChatConfig, Config, DatabaseConfig, NotificationConfig, ServerConfig, StorageConfig,
};
use chainfeed_core::{InlineDispatcher, NotificationService};
use chainfeed_db::repositories::{NotificationRepository, UserRepository};
use chainfeed_db::test_utils::TestDatabase;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    _db: TestDatabase,
    _uploads: TempDir,
}

/// Create a test configuration with uploads in `upload_dir`.
fn create_test_config(upload_dir: &std::path::Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "http://localhost:3000".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        storage: StorageConfig {
            upload_dir: upload_dir.to_path_buf(),
            ..StorageConfig::default()
        },
        chat: ChatConfig::default(),
        notifications: NotificationConfig { queue_capacity: 0 },
    }
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDatabase::in_memory().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let config = create_test_config(uploads.path());

        let conn = db.connection();
        let notifications = NotificationService::new(
            NotificationRepository::new(Arc::clone(&conn)),
            UserRepository::new(Arc::clone(&conn)),
        );
        let dispatcher = Arc::new(InlineDispatcher::new(notifications));
        let state = AppState::build(conn, &config, dispatcher).unwrap();

        Self {
            router: Router::new().nest("/api", api_router()).with_state(state),
            _db: db,
            _uploads: uploads,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn login(&self, address: &str) {
        let (status, _) = self
            .post("/api/auth/login", json!({ "wallet_address": address }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn create_post(&self, author: &str, content: &str, public: bool) -> String {
        let (status, body) = self
            .post(
                "/api/posts",
                json!({
                    "author_address": author,
                    "content": content,
                    "is_unfollow": public,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_creates_user_with_default_name() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/auth/login", json!({ "wallet_address": "0xabcdef123" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["wallet_address"], "0xabcdef123");
    assert_eq!(body["user"]["display_name"], "User 0xabcd");
}

#[tokio::test]
async fn test_login_without_address_returns_400() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/api/auth/login", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_invalid_json_returns_400() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/posts")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_follow_lifecycle() {
    let app = TestApp::new().await;
    app.login("0xa").await;
    app.login("0xb").await;

    let (status, body) = app
        .post("/api/users/0xb/follow", json!({ "follower_address": "0xa" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["following_address"], "0xb");

    let (status, _) = app
        .post("/api/users/0xb/follow", json!({ "follower_address": "0xa" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get("/api/users/0xb/follow?follower_address=0xa").await;
    assert_eq!(body["isFollowing"], true);

    let (_, following) = app.get("/api/users/0xa/following").await;
    assert_eq!(following[0]["wallet_address"], "0xb");
    assert_eq!(following[0]["_count"]["followers"], 1);

    let (status, body) = app
        .send(Method::DELETE, "/api/users/0xb/follow?follower_address=0xa", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = app.get("/api/users/0xb/follow?follower_address=0xa").await;
    assert_eq!(body["isFollowing"], false);
}

#[tokio::test]
async fn test_follow_status_requires_follower() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/users/0xb/follow").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Bad request: Follower address is required");
}

#[tokio::test]
async fn test_follow_unknown_user_returns_404() {
    let app = TestApp::new().await;
    app.login("0xa").await;

    let (status, body) = app
        .post("/api/users/0xnobody/follow", json!({ "follower_address": "0xa" }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_like_notifies_author_and_updates_feed() {
    let app = TestApp::new().await;
    app.login("0xa").await;
    app.login("0xb").await;
    let post_id = app.create_post("0xb", "gm", true).await;

    let (status, like) = app
        .post(
            &format!("/api/posts/{post_id}/like"),
            json!({ "user_address": "0xa", "transaction_hash": "0xtx" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(like["transaction_hash"], "0xtx");

    let (status, _) = app
        .post(
            &format!("/api/posts/{post_id}/like"),
            json!({ "user_address": "0xa" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, page) = app.get("/api/notifications?recipientAddress=0xb").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["pagination"]["limit"], 20);
    let notification = &page["data"][0];
    assert_eq!(notification["type"], "LIKE");
    assert_eq!(notification["sender_address"], "0xa");
    assert_eq!(notification["formatted_text"], "User 0xa liked your post");
    assert_eq!(notification["sender"]["wallet_address"], "0xa");

    let (_, feed) = app.get("/api/posts?userAddress=0xa").await;
    assert_eq!(feed[0]["likes"], json!([{ "user_address": "0xa" }]));
}

#[tokio::test]
async fn test_private_post_visibility() {
    let app = TestApp::new().await;
    for address in ["0xa", "0xb", "0xc"] {
        app.login(address).await;
    }
    app.post("/api/users/0xb/follow", json!({ "follower_address": "0xa" }))
        .await;
    let post_id = app.create_post("0xb", "followers only", false).await;

    let (_, feed_a) = app.get("/api/posts?userAddress=0xa").await;
    assert_eq!(feed_a.as_array().unwrap().len(), 1);

    let (_, feed_c) = app.get("/api/posts?userAddress=0xc").await;
    assert!(feed_c.as_array().unwrap().is_empty());

    let (status, _) = app.get(&format!("/api/posts/{post_id}?userAddress=0xc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, profile) = app.get("/api/users/0xb?requestingUserAddress=0xa").await;
    assert_eq!(profile["is_following"], true);
    assert_eq!(profile["posts"].as_array().unwrap().len(), 1);

    let (_, profile) = app.get("/api/users/0xb?requestingUserAddress=0xc").await;
    assert_eq!(profile["is_following"], false);
    assert!(profile["posts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_comments() {
    let app = TestApp::new().await;
    let post_id = app.create_post("0xb", "thoughts?", true).await;

    let (status, comment) = app
        .post(
            &format!("/api/posts/{post_id}/comments"),
            json!({ "author_address": "0xa", "content": "nice" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["content"], "nice");

    let (_, comments) = app.get(&format!("/api/posts/{post_id}/comments")).await;
    assert_eq!(comments.as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(
            "/api/posts/missing/comments",
            json!({ "author_address": "0xa", "content": "hello?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_friends_endpoints() {
    let app = TestApp::new().await;
    app.login("0xa").await;
    app.login("0xb").await;

    let (status, body) = app
        .post("/api/users/0xa/friends", json!({ "friendAddress": "0xb" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, friends) = app.get("/api/users/0xb/friends").await;
    assert_eq!(friends[0]["wallet_address"], "0xa");

    let (status, _) = app
        .send(Method::DELETE, "/api/users/0xa/friends?friendAddress=0xb", None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::DELETE, "/api/users/0xa/friends?friendAddress=0xb", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notification_read_and_delete() {
    let app = TestApp::new().await;
    app.login("0xa").await;
    app.login("0xb").await;
    app.post("/api/users/0xb/follow", json!({ "follower_address": "0xa" }))
        .await;

    let (_, page) = app.get("/api/notifications?recipientAddress=0xb").await;
    let id = page["data"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(Method::PATCH, "/api/notifications", Some(json!({ "id": id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], true);

    let (_, unread) = app.get("/api/notifications?recipientAddress=0xb").await;
    assert_eq!(unread["pagination"]["total"], 0);

    let (_, all) = app
        .get("/api/notifications?recipientAddress=0xb&includeRead=true")
        .await;
    assert_eq!(all["pagination"]["total"], 1);

    let (status, _) = app.send(Method::DELETE, "/api/notifications", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::DELETE, "/api/notifications?recipientAddress=0xb", None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = app
        .get("/api/notifications?recipientAddress=0xb&includeRead=true")
        .await;
    assert_eq!(all["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_list_notifications_requires_recipient() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/notifications").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_message() {
    let app = TestApp::new().await;
    app.login("0xa").await;
    app.login("0xb").await;

    let (status, body) = app
        .post(
            "/api/messages",
            json!({ "senderAddress": "0xa", "recipientAddress": "0xb", "message": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["type"], "MESSAGE");
    assert_eq!(body["data"]["formatted_text"], "User 0xa sent you a message: \"hi\"");

    let (status, body) = app
        .post(
            "/api/messages",
            json!({ "senderAddress": "0xa", "recipientAddress": "0xa", "message": "me" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);

    let (status, _) = app
        .post(
            "/api/messages",
            json!({ "senderAddress": "0xa", "recipientAddress": "0xnobody", "message": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/api/messages", json!({ "senderAddress": "0xa", "recipientAddress": "0xb", "message": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "Validation error: Sender address, recipient address, and message are required"
    );
}

#[tokio::test]
async fn test_search() {
    let app = TestApp::new().await;
    app.login("0xsatoshi").await;
    app.create_post("0xsatoshi", "block rewards", true).await;

    let (status, body) = app.get("/api/search?q=block&type=posts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert!(body["users"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/api/search?q=SATOSHI").await;
    assert_eq!(body["users"][0]["wallet_address"], "0xsatoshi");
    assert_eq!(body["users"][0]["_count"]["posts"], 1);
}

#[tokio::test]
async fn test_user_files() {
    let app = TestApp::new().await;

    let (status, file) = app
        .post(
            "/api/user-files",
            json!({ "userAddress": "0xa", "fileName": "paper.pdf", "fileType": "application/pdf" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = file["id"].as_str().unwrap().to_string();

    let (_, files) = app.get("/api/user-files?userAddress=0xa").await;
    assert_eq!(files.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/user-files?fileId={id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/user-files", json!({ "userAddress": "0xa" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_object());
}

#[tokio::test]
async fn test_upload_then_serve() {
    let app = TestApp::new().await;
    let boundary = "chainfeedtestboundary";
    let multipart = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"my photo.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         not really a png\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(multipart))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/api/static/"));
    assert!(url.ends_with("-my_photo.png"));

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=86400"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"not really a png");
}

#[tokio::test]
async fn test_static_missing_or_escaping_returns_404() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/static/missing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/static/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
