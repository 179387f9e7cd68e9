use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sea_orm::{ActiveValue::Set, IntoActiveModel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{StorageConfig, UploadConfig};
use crate::db::{InsertError, Store, UniqueColumn};
use crate::db::repositories::user::hash_password_blocking;
use crate::entities::users;
use crate::query::{PageRequest, PageResponse, paginate};
use crate::storage::ObjectStore;

use super::user_service::{
    CreateUserRequest, PartialUpdateUserRequest, UpdateUserRequest, UserDto, UserError,
    UserService,
};

const SYSTEM_ACTOR: &str = "system";

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

pub struct SqlUserService {
    store: Store,
    storage: Arc<dyn ObjectStore>,
    allowed_types: Vec<String>,
    presign_expiry: Duration,
}

impl SqlUserService {
    #[must_use]
    pub fn new(
        store: Store,
        storage: Arc<dyn ObjectStore>,
        upload: &UploadConfig,
        storage_config: &StorageConfig,
    ) -> Self {
        Self {
            store,
            storage,
            allowed_types: upload.allowed_types.clone(),
            presign_expiry: Duration::from_secs(storage_config.presigned_url_expiry_secs),
        }
    }

    async fn require_user(&self, id: i64) -> Result<users::Model, UserError> {
        self.store
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("User not found with id: {id}")))
    }
}

#[async_trait]
impl UserService for SqlUserService {
    async fn create(&self, request: CreateUserRequest) -> Result<UserDto, UserError> {
        if let Some(existing) = self
            .store
            .find_user_by_idempotency_key(&request.idempotency_key)
            .await?
        {
            info!(
                user_id = existing.user_id,
                "Create replayed for known idempotency key"
            );
            return Ok(existing.into());
        }

        let hash = hash_password_blocking(&request.password).await?;
        let now = Utc::now();

        let user = users::ActiveModel {
            idempotency_key: Set(request.idempotency_key.clone()),
            user_name: Set(request.user_name.clone()),
            email: Set(request.email.clone()),
            password: Set(hash),
            date_of_birth: Set(request.date_of_birth),
            date_of_leaving: Set(request.date_of_leaving),
            postal_code: Set(request.postal_code),
            profile_image_object_name: Set(None),
            profile_image_bucket: Set(None),
            created_by: Set(Some(SYSTEM_ACTOR.to_string())),
            created_date: Set(Some(now)),
            updated_by: Set(Some(SYSTEM_ACTOR.to_string())),
            updated_date: Set(Some(now)),
            is_deleted: Set(false),
            deleted_date: Set(None),
            ..Default::default()
        };

        match self.store.insert_user(user).await {
            Ok(model) => Ok(model.into()),
            Err(InsertError::Conflict {
                constraint: Some(UniqueColumn::Email),
                ..
            }) => Err(UserError::AlreadyExists {
                field: "email",
                value: request.email,
            }),
            Err(InsertError::Conflict {
                constraint: Some(UniqueColumn::UserName),
                ..
            }) => Err(UserError::AlreadyExists {
                field: "user_name",
                value: request.user_name,
            }),
            Err(InsertError::Conflict {
                constraint: Some(UniqueColumn::IdempotencyKey),
                source,
            }) => {
                // Lost a concurrent race on the same key: the winner's row is
                // the canonical result.
                warn!(
                    idempotency_key = %request.idempotency_key,
                    "Concurrent create detected, returning the winner"
                );
                match self
                    .store
                    .find_user_by_idempotency_key(&request.idempotency_key)
                    .await?
                {
                    Some(winner) => Ok(winner.into()),
                    None => Err(UserError::Conflict(source.to_string())),
                }
            }
            Err(InsertError::Conflict {
                constraint: None,
                source,
            }) => Err(UserError::Conflict(source.to_string())),
            Err(InsertError::Db(err)) => Err(err.into()),
        }
    }

    async fn find_all(&self) -> Result<Vec<UserDto>, UserError> {
        let users = self.store.find_all_users().await?;
        if users.is_empty() {
            return Err(UserError::NotFound("No users found".to_string()));
        }
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<UserDto, UserError> {
        Ok(self.require_user(id).await?.into())
    }

    async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<UserDto, UserError> {
        let current = self.require_user(id).await?;
        let mut user = current.into_active_model();

        user.user_name = Set(request.user_name);
        user.email = Set(request.email);
        user.date_of_birth = Set(request.date_of_birth);
        user.date_of_leaving = Set(request.date_of_leaving);
        user.postal_code = Set(request.postal_code);
        if !request.password.trim().is_empty() {
            user.password = Set(hash_password_blocking(&request.password).await?);
        }
        user.updated_by = Set(Some(SYSTEM_ACTOR.to_string()));
        user.updated_date = Set(Some(Utc::now()));

        Ok(self.store.update_user(user).await?.into())
    }

    async fn partial_update(
        &self,
        id: i64,
        request: PartialUpdateUserRequest,
    ) -> Result<UserDto, UserError> {
        let current = self.require_user(id).await?;
        let mut user = current.into_active_model();

        if let Some(user_name) = request.user_name {
            user.user_name = Set(user_name);
        }
        if let Some(email) = request.email {
            user.email = Set(email);
        }
        if let Some(password) = request.password {
            if !password.trim().is_empty() {
                user.password = Set(hash_password_blocking(&password).await?);
            }
        }
        if let Some(date_of_birth) = request.date_of_birth {
            user.date_of_birth = Set(date_of_birth);
        }
        if let Some(date_of_leaving) = request.date_of_leaving {
            user.date_of_leaving = Set(date_of_leaving);
        }
        if let Some(postal_code) = request.postal_code {
            user.postal_code = Set(postal_code);
        }
        user.updated_by = Set(Some(SYSTEM_ACTOR.to_string()));
        user.updated_date = Set(Some(Utc::now()));

        Ok(self.store.update_user(user).await?.into())
    }

    async fn deactivate(&self, id: i64) -> Result<(), UserError> {
        let Some(current) = self.store.find_user_by_id(id).await? else {
            return Ok(());
        };

        let mut user = current.into_active_model();
        let now = Utc::now();
        user.is_deleted = Set(true);
        user.deleted_date = Set(Some(now));
        user.updated_by = Set(Some(SYSTEM_ACTOR.to_string()));
        user.updated_date = Set(Some(now));

        self.store.update_user(user).await?;
        info!(user_id = id, "User deactivated");
        Ok(())
    }

    async fn activate(&self, id: i64) -> Result<(), UserError> {
        let Some(current) = self.store.find_user_by_id(id).await? else {
            return Ok(());
        };

        let mut user = current.into_active_model();
        user.is_deleted = Set(false);
        user.deleted_date = Set(None);
        user.updated_by = Set(Some(SYSTEM_ACTOR.to_string()));
        user.updated_date = Set(Some(Utc::now()));

        self.store.update_user(user).await?;
        info!(user_id = id, "User activated");
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), UserError> {
        if !self.store.delete_user(id).await? {
            return Err(UserError::NotFound(format!(
                "User not found with id: {id}"
            )));
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn search(&self, request: PageRequest) -> Result<PageResponse<UserDto>, UserError> {
        Ok(paginate::<users::Schema, UserDto>(&self.store.conn, &request).await?)
    }

    async fn upload_profile_image(
        &self,
        id: i64,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, UserError> {
        if !self
            .allowed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(content_type))
        {
            return Err(UserError::InvalidFileType(format!(
                "Content type '{content_type}' is not allowed"
            )));
        }

        let lower_name = file_name.to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.iter().any(|ext| lower_name.ends_with(ext)) {
            return Err(UserError::InvalidFileType(format!(
                "File '{file_name}' must end with .jpg, .jpeg or .png"
            )));
        }

        let current = self.require_user(id).await?;

        // Replace, not accumulate: drop the previous object first. A failed
        // delete only leaks an orphan, so it must not fail the upload.
        if let Some(old_key) = &current.profile_image_object_name {
            if let Err(err) = self.storage.remove_object(old_key).await {
                warn!(user_id = id, object = %old_key, "Failed to remove previous profile image: {err:#}");
            }
        }

        let object_name = format!("user-{id}-{}-{file_name}", Uuid::new_v4());

        self.storage
            .put_object(&object_name, data, content_type)
            .await
            .map_err(|e| UserError::Storage(e.to_string()))?;

        let mut user = current.into_active_model();
        user.profile_image_object_name = Set(Some(object_name.clone()));
        user.profile_image_bucket = Set(Some(self.storage.bucket().to_string()));
        user.updated_by = Set(Some(SYSTEM_ACTOR.to_string()));
        user.updated_date = Set(Some(Utc::now()));
        self.store.update_user(user).await?;

        self.storage
            .presign_get(&object_name, self.presign_expiry)
            .await
            .map_err(|e| UserError::Storage(e.to_string()))
    }

    async fn get_profile_image_url(&self, id: i64) -> Result<String, UserError> {
        let user = self.require_user(id).await?;

        let Some(object_name) = user.profile_image_object_name else {
            return Err(UserError::NotFound(format!(
                "User {id} has no profile image"
            )));
        };

        self.storage
            .presign_get(&object_name, self.presign_expiry)
            .await
            .map_err(|e| UserError::Storage(e.to_string()))
    }
}
