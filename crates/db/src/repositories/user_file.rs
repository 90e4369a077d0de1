//! User file repository.

use std::sync::Arc;

use crate::entities::{UserFile, user_file};
use chainfeed_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

/// User file repository for database operations.
#[derive(Clone)]
pub struct UserFileRepository {
    db: Arc<DatabaseConnection>,
}

impl UserFileRepository {
    /// Create a new user file repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a file record by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user_file::Model>> {
        UserFile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new file record.
    pub async fn create(&self, model: user_file::ActiveModel) -> AppResult<user_file::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// File records for a user, newest first.
    pub async fn find_by_user(&self, user_address: &str) -> AppResult<Vec<user_file::Model>> {
        UserFile::find()
            .filter(user_file::Column::UserAddress.eq(user_address))
            .order_by_desc(user_file::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a file record.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let file = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File: {id}")))?;

        file.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
