use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, SqlErr,
};
use thiserror::Error;
use tokio::task;

use crate::entities::{prelude::*, users};

/// Which declared unique constraint an insert violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueColumn {
    Email,
    UserName,
    IdempotencyKey,
}

/// Failure mode of a flushed insert. Unique violations carry a structured
/// constraint descriptor so callers never parse store error text themselves;
/// `constraint: None` means the conflict could not be identified and must be
/// re-raised as-is.
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("unique constraint violation: {source}")]
    Conflict {
        constraint: Option<UniqueColumn>,
        #[source]
        source: DbErr,
    },

    #[error(transparent)]
    Db(DbErr),
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Immediate, flushed insert. Unique violations come back classified.
    pub async fn insert(&self, user: users::ActiveModel) -> Result<users::Model, InsertError> {
        user.insert(&self.conn).await.map_err(|err| {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                InsertError::Conflict {
                    constraint: classify_unique_violation(&err),
                    source: err,
                }
            } else {
                InsertError::Db(err)
            }
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<users::Model>> {
        Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")
    }

    pub async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::IdempotencyKey.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query user by idempotency key")
    }

    pub async fn find_all(&self) -> Result<Vec<users::Model>> {
        Users::find()
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let count = Users::find_by_id(id)
            .count(&self.conn)
            .await
            .context("Failed to check user existence")?;
        Ok(count > 0)
    }

    pub async fn update(&self, user: users::ActiveModel) -> Result<users::Model> {
        user.update(&self.conn)
            .await
            .context("Failed to update user")
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected > 0)
    }
}

/// Maps a store unique-violation error onto the declared constraint that
/// fired, by the column named in the violation message.
#[must_use]
pub fn classify_unique_violation(err: &DbErr) -> Option<UniqueColumn> {
    let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() else {
        return None;
    };

    if message.contains("users.email") || message.contains("uk_user_email") {
        Some(UniqueColumn::Email)
    } else if message.contains("users.user_name") || message.contains("uk_user_username") {
        Some(UniqueColumn::UserName)
    } else if message.contains("users.idempotency_key")
        || message.contains("uk_user_idempotency_key")
    {
        Some(UniqueColumn::IdempotencyKey)
    } else {
        None
    }
}

/// Hash a password with Argon2id.
/// Runs on the caller's thread; use [`hash_password_blocking`] from async
/// contexts.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Hash a password on a blocking task so Argon2's CPU work stays off the
/// async runtime.
pub async fn hash_password_blocking(password: &str) -> Result<String> {
    let password = password.to_string();
    task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task panicked")?
}
