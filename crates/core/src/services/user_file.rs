//! Knowledge-base file metadata.
//!
//! Only names and types are recorded; file contents live elsewhere.

use chainfeed_common::{AppError, AppResult, IdGenerator};
use chainfeed_db::{entities::user_file, repositories::{UserFileRepository, UserRepository}};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::user::default_display_name;

/// Input for recording a file.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserFileInput {
    /// Owner wallet address.
    #[validate(length(min = 1, max = 128))]
    pub user_address: String,

    /// File name or URL.
    #[validate(length(min = 1, max = 512))]
    pub file_name: String,

    /// MIME type or category.
    #[validate(length(min = 1, max = 128))]
    pub file_type: String,
}

/// User file service.
#[derive(Clone)]
pub struct UserFileService {
    file_repo: UserFileRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserFileService {
    /// Create a new user file service.
    #[must_use]
    pub const fn new(file_repo: UserFileRepository, user_repo: UserRepository) -> Self {
        Self {
            file_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// A user's files, newest first.
    pub async fn list(&self, user_address: &str) -> AppResult<Vec<user_file::Model>> {
        self.file_repo.find_by_user(user_address).await
    }

    /// Record a file.
    pub async fn create(&self, input: CreateUserFileInput) -> AppResult<user_file::Model> {
        input
            .validate()
            .map_err(|_| AppError::Validation("Missing required fields".to_string()))?;

        self.user_repo
            .ensure_exists(&input.user_address, Some(default_display_name(&input.user_address)))
            .await?;

        let model = user_file::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_address: Set(input.user_address),
            file_name: Set(input.file_name),
            file_type: Set(input.file_type),
            created_at: Set(Utc::now().into()),
        };
        self.file_repo.create(model).await
    }

    /// Delete a file record.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.file_repo.delete(id).await
    }
}
