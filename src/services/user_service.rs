use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::users;
use crate::query::{PageRequest, PageResponse, QueryError};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub idempotency_key: String,
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
    pub date_of_leaving: NaiveDate,
    pub postal_code: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub user_name: String,
    pub email: String,
    /// Blank means "keep the current password".
    #[serde(default)]
    pub password: String,
    pub date_of_birth: NaiveDate,
    pub date_of_leaving: NaiveDate,
    pub postal_code: i32,
}

/// Field-by-field patch; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialUpdateUserRequest {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_leaving: Option<NaiveDate>,
    pub postal_code: Option<i32>,
}

/// Outbound user projection. The password hash never appears here.
#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub user_id: i64,
    pub idempotency_key: String,
    pub user_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub date_of_leaving: NaiveDate,
    pub postal_code: i32,
    pub profile_image_object_name: Option<String>,
    pub profile_image_bucket: Option<String>,
    pub audit: AuditHistoryDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditHistoryDto {
    pub created_by: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub updated_date: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub deleted_date: Option<DateTime<Utc>>,
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            user_id: model.user_id,
            idempotency_key: model.idempotency_key,
            user_name: model.user_name,
            email: model.email,
            date_of_birth: model.date_of_birth,
            date_of_leaving: model.date_of_leaving,
            postal_code: model.postal_code,
            profile_image_object_name: model.profile_image_object_name,
            profile_image_bucket: model.profile_image_bucket,
            audit: AuditHistoryDto {
                created_by: model.created_by,
                created_date: model.created_date,
                updated_by: model.updated_by,
                updated_date: model.updated_date,
                deleted: model.is_deleted,
                deleted_date: model.deleted_date,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    NotFound(String),

    #[error("User already exists with {field}: {value}")]
    AlreadyExists { field: &'static str, value: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<QueryError> for UserError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Filter(e) => Self::InvalidFilter(e.to_string()),
            QueryError::ZeroPageSize => Self::InvalidFilter(err.to_string()),
            QueryError::Db(e) => Self::Database(e.to_string()),
        }
    }
}

#[async_trait]
pub trait UserService: Send + Sync {
    /// Idempotent creation: resubmitting the same `idempotency_key` returns
    /// the already-created user instead of a duplicate.
    async fn create(&self, request: CreateUserRequest) -> Result<UserDto, UserError>;

    async fn find_all(&self) -> Result<Vec<UserDto>, UserError>;

    async fn find_by_id(&self, id: i64) -> Result<UserDto, UserError>;

    async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<UserDto, UserError>;

    async fn partial_update(
        &self,
        id: i64,
        request: PartialUpdateUserRequest,
    ) -> Result<UserDto, UserError>;

    /// Soft delete. Succeeds silently when the id does not exist.
    async fn deactivate(&self, id: i64) -> Result<(), UserError>;

    /// Clears the soft-delete flag. Succeeds silently when the id does not
    /// exist.
    async fn activate(&self, id: i64) -> Result<(), UserError>;

    /// Hard delete; the row is gone afterwards, deleted or not.
    async fn delete(&self, id: i64) -> Result<(), UserError>;

    async fn search(&self, request: PageRequest) -> Result<PageResponse<UserDto>, UserError>;

    /// Stores the image, replaces any previous one and returns a presigned
    /// download URL.
    async fn upload_profile_image(
        &self,
        id: i64,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, UserError>;

    async fn get_profile_image_url(&self, id: i64) -> Result<String, UserError>;
}
