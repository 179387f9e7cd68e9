use sea_orm::entity::prelude::*;

use crate::query::{FieldDef, FieldKind, FilterSchema};

/// User record with a flattened audit block. Uniqueness of `email`,
/// `user_name` and `idempotency_key` is enforced by named indexes created in
/// the migrator, so violations can be classified by constraint.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub user_id: i64,

    /// Client-supplied token; immutable after creation.
    pub idempotency_key: String,

    pub user_name: String,

    pub email: String,

    /// Argon2id password hash. Write-only: never serialized into responses.
    pub password: String,

    pub date_of_birth: Date,

    pub date_of_leaving: Date,

    pub postal_code: i32,

    pub profile_image_object_name: Option<String>,

    pub profile_image_bucket: Option<String>,

    pub created_by: Option<String>,

    pub created_date: Option<DateTimeUtc>,

    pub updated_by: Option<String>,

    pub updated_date: Option<DateTimeUtc>,

    /// Soft-delete flag; `deleted_date` is non-null iff this is true.
    pub is_deleted: bool,

    pub deleted_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Filter/sort registry for the `users` entity.
///
/// Paths are canonical snake_case; the embedded audit block is addressed with
/// an `audit.` prefix. `password` is deliberately unregistered so it can be
/// neither filtered, sorted, nor free-text searched.
pub struct Schema;

impl FilterSchema for Schema {
    type Entity = Entity;

    fn resolve(path: &str) -> Option<FieldDef<Column>> {
        let def = match path {
            "user_id" => FieldDef::new(Column::UserId, FieldKind::BigInt),
            "idempotency_key" => FieldDef::new(Column::IdempotencyKey, FieldKind::Text),
            "user_name" => FieldDef::new(Column::UserName, FieldKind::Text),
            "email" => FieldDef::new(Column::Email, FieldKind::Text),
            "date_of_birth" => FieldDef::new(Column::DateOfBirth, FieldKind::Date),
            "date_of_leaving" => FieldDef::new(Column::DateOfLeaving, FieldKind::Date),
            "postal_code" => FieldDef::new(Column::PostalCode, FieldKind::Integer),
            "profile_image_object_name" => {
                FieldDef::new(Column::ProfileImageObjectName, FieldKind::Text)
            }
            "profile_image_bucket" => FieldDef::new(Column::ProfileImageBucket, FieldKind::Text),
            "audit.created_by" => FieldDef::new(Column::CreatedBy, FieldKind::Text),
            "audit.created_date" => FieldDef::new(Column::CreatedDate, FieldKind::DateTime),
            "audit.updated_by" => FieldDef::new(Column::UpdatedBy, FieldKind::Text),
            "audit.updated_date" => FieldDef::new(Column::UpdatedDate, FieldKind::DateTime),
            "audit.deleted" => FieldDef::new(Column::IsDeleted, FieldKind::Boolean),
            "audit.deleted_date" => FieldDef::new(Column::DeletedDate, FieldKind::DateTime),
            _ => return None,
        };
        Some(def)
    }

    fn id_field() -> FieldDef<Column> {
        FieldDef::new(Column::UserId, FieldKind::BigInt)
    }

    fn searchable() -> Vec<Column> {
        vec![
            Column::IdempotencyKey,
            Column::UserName,
            Column::Email,
            Column::ProfileImageObjectName,
            Column::ProfileImageBucket,
        ]
    }
}
