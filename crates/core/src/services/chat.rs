//! Proxy to the external chat and avatar-video service.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chainfeed_common::{AppError, AppResult, Config};
use chainfeed_db::repositories::UserRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Avatar used when the user has no source photo, relative to the public
/// directory.
const DEFAULT_AVATAR: &str = "uploads/654b536c8c46e155141a426a.png";

const FEMALE_VOICE: &str = "BV001";
const DEFAULT_VOICE: &str = "BV002";

/// Input for a chat turn.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatInput {
    /// Wallet address of the user chatting.
    #[validate(length(min = 1, max = 128))]
    pub user_address: String,

    /// Conversation so far, forwarded untouched.
    #[serde(default)]
    pub messages: Value,
}

#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    user_address: &'a str,
    messages: &'a Value,
    avatar_path: String,
    gender_code: &'static str,
}

/// Voice code sent upstream for a stored gender.
#[must_use]
pub fn gender_code(gender: Option<&str>) -> &'static str {
    if gender == Some("FEMALE") {
        FEMALE_VOICE
    } else {
        DEFAULT_VOICE
    }
}

/// Chat proxy service.
#[derive(Clone)]
pub struct ChatService {
    user_repo: UserRepository,
    http_client: Arc<reqwest::Client>,
    service_url: String,
    video_base_url: Option<String>,
    video_url_file: PathBuf,
    public_dir: PathBuf,
}

impl ChatService {
    /// Create a new chat service.
    pub fn new(user_repo: UserRepository, config: &Config) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.chat.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        let cwd = std::env::current_dir().unwrap_or_default();

        Ok(Self {
            user_repo,
            http_client: Arc::new(http_client),
            service_url: config.chat.service_url.trim_end_matches('/').to_string(),
            video_base_url: config.chat.video_base_url.clone(),
            video_url_file: config.chat.video_url_file.clone(),
            public_dir: cwd.join("public"),
        })
    }

    /// Forward a chat turn and return the upstream reply with media URLs
    /// made absolute.
    pub async fn chat(&self, input: ChatInput) -> AppResult<Value> {
        input.validate()?;

        let user = self.user_repo.find_by_address(&input.user_address).await?;
        let avatar_path = self.avatar_path(
            user.as_ref().and_then(|u| u.avatar_real_url.as_deref()),
        );
        let gender_code = gender_code(user.as_ref().and_then(|u| u.gender.as_deref()));

        tracing::debug!(user = %input.user_address, avatar = %avatar_path, gender_code, "Forwarding chat request");

        let body = UpstreamRequest {
            user_address: &input.user_address,
            messages: &input.messages,
            avatar_path,
            gender_code,
        };

        let response = self
            .http_client
            .post(format!("{}/api/chat", self.service_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chat service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Chat service returned an error");
            return Err(AppError::ExternalService(format!(
                "Chat service error: {status}"
            )));
        }

        let mut reply: Value = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid chat service response: {e}")))?;

        if has_media(&reply) {
            let base = self.video_base_url().await?;
            prefix_media_urls(&mut reply, &base);
        }

        Ok(reply)
    }

    fn avatar_path(&self, avatar_real_url: Option<&str>) -> String {
        let relative = avatar_real_url
            .map(|url| url.trim_start_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_AVATAR);
        self.public_dir.join(relative).to_string_lossy().into_owned()
    }

    async fn video_base_url(&self) -> AppResult<String> {
        if let Some(url) = &self.video_base_url {
            return Ok(url.clone());
        }
        read_base_url(&self.video_url_file).await
    }
}

async fn read_base_url(path: &Path) -> AppResult<String> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Config(format!("Failed to read {}: {e}", path.display()))
    })?;
    Ok(contents
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

const MEDIA_FIELDS: [&str; 2] = ["video_url", "audio_url"];

fn has_media(reply: &Value) -> bool {
    MEDIA_FIELDS
        .iter()
        .any(|field| reply.get(field).and_then(Value::as_str).is_some_and(|s| !s.is_empty()))
}

/// Prefix non-empty `video_url` and `audio_url` with `base`.
fn prefix_media_urls(reply: &mut Value, base: &str) {
    for field in MEDIA_FIELDS {
        let prefixed = match reply.get(field).and_then(Value::as_str) {
            Some(path) if !path.is_empty() => format!("{base}{path}"),
            _ => continue,
        };
        reply[field] = Value::String(prefixed);
    }
}
