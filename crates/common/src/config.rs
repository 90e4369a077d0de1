//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chat/avatar-video proxy configuration.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Notification dispatch configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Local upload storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written to and served from.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// URL prefix returned for uploaded files.
    #[serde(default = "default_public_path")]
    pub public_path: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            public_path: default_public_path(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Chat microservice proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the chat microservice.
    #[serde(default = "default_chat_service_url")]
    pub service_url: String,
    /// Base URL prepended to returned media paths.
    #[serde(default)]
    pub video_base_url: Option<String>,
    /// File whose first line holds the media base URL when
    /// `video_base_url` is unset.
    #[serde(default = "default_video_url_file")]
    pub video_url_file: PathBuf,
    /// Upstream request timeout in seconds.
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            service_url: default_chat_service_url(),
            video_base_url: None,
            video_url_file: default_video_url_file(),
            timeout_secs: default_chat_timeout_secs(),
        }
    }
}

/// Notification dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Capacity of the background dispatch queue. Zero dispatches inline.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./public/uploads")
}

fn default_public_path() -> String {
    "/api/static".to_string()
}

const fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_chat_service_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_video_url_file() -> PathBuf {
    PathBuf::from("videourl.txt")
}

const fn default_chat_timeout_secs() -> u64 {
    120
}

const fn default_queue_capacity() -> usize {
    1000
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CHAINFEED_ENV`)
    /// 3. Environment variables with `CHAINFEED__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("CHAINFEED_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CHAINFEED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CHAINFEED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_applies_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
url = "http://localhost:3000"

[database]
url = "postgres://localhost/chainfeed"

[chat]
video_base_url = "http://media.local"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.storage.public_path, "/api/static");
        assert_eq!(config.chat.video_base_url.as_deref(), Some("http://media.local"));
        assert_eq!(config.chat.service_url, "http://127.0.0.1:8000");
        assert_eq!(config.notifications.queue_capacity, 1000);
    }
}
