use sea_orm::{ColumnTrait, Condition, EntityTrait};
use serde::Deserialize;
use thiserror::Error;

use super::coerce::{self, CoerceError, FieldKind};

/// One untyped field/operator/value triple from a search request.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterCriterion {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Resolved metadata for one registered field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef<C> {
    pub column: C,
    pub kind: FieldKind,
}

impl<C> FieldDef<C> {
    #[must_use]
    pub const fn new(column: C, kind: FieldKind) -> Self {
        Self { column, kind }
    }
}

/// Compile-time registry mapping an entity's field paths to column metadata.
///
/// This replaces runtime reflection: each entity declares which dot-separated
/// paths are addressable, which field is its primary key, and which columns
/// participate in free-text search.
pub trait FilterSchema {
    type Entity: EntityTrait;

    /// Resolves a canonical (snake_case) field path, or `None` if the path is
    /// not registered.
    fn resolve(path: &str) -> Option<FieldDef<<Self::Entity as EntityTrait>::Column>>;

    /// The entity's declared primary-key field, used as the sort fallback.
    fn id_field() -> FieldDef<<Self::Entity as EntityTrait>::Column>;

    /// Text columns matched by the free-text search term.
    fn searchable() -> Vec<<Self::Entity as EntityTrait>::Column>;
}

/// A filter the engine refuses to build a predicate for.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown filter field: {0}")]
    UnknownField(String),

    #[error("LIKE operator only applies to text fields: {0}")]
    LikeOnNonText(String),

    #[error("field {field} is not ordered; operator '{operator}' does not apply")]
    NotOrdered { field: String, operator: String },

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error(transparent)]
    Value(#[from] CoerceError),
}

/// Lowercases camelCase path segments into the registry's snake_case form,
/// so `postalCode` and `audit.deletedDate` resolve alongside the canonical
/// spellings.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 4);
    for c in path.trim().chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Builds one composable boolean predicate from a free-text search term and a
/// list of filter criteria.
///
/// Filters AND together; a non-blank search term ORs a `LIKE %term%` across
/// the schema's searchable columns and ANDs that group in. With no filters
/// and a blank search the result is the match-everything condition.
pub fn build_condition<S: FilterSchema>(
    search: &str,
    filters: &[FilterCriterion],
) -> Result<Condition, FilterError> {
    let mut cond = Condition::all();

    for filter in filters {
        let path = normalize_path(&filter.field);
        let def = S::resolve(&path)
            .ok_or_else(|| FilterError::UnknownField(filter.field.clone()))?;
        let col = def.column;

        let expr = match filter.operator.to_ascii_lowercase().as_str() {
            "eq" => col.eq(coerce::coerce(def.kind, &filter.value)?),
            "ne" => col.ne(coerce::coerce(def.kind, &filter.value)?),
            "like" => {
                if !def.kind.is_text() {
                    return Err(FilterError::LikeOnNonText(filter.field.clone()));
                }
                let text = coerce::coerce_text(&filter.value)?;
                col.like(format!("%{text}%"))
            }
            op @ ("lt" | "lte" | "gt" | "gte") => {
                if !def.kind.is_ordered() {
                    return Err(FilterError::NotOrdered {
                        field: filter.field.clone(),
                        operator: op.to_string(),
                    });
                }
                let value = coerce::coerce(def.kind, &filter.value)?;
                match op {
                    "lt" => col.lt(value),
                    "lte" => col.lte(value),
                    "gt" => col.gt(value),
                    _ => col.gte(value),
                }
            }
            "in" => col.is_in(coerce::coerce_each(def.kind, &filter.value)?),
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        };

        cond = cond.add(expr);
    }

    if !search.trim().is_empty() {
        let columns = S::searchable();
        if !columns.is_empty() {
            let mut any = Condition::any();
            for col in columns {
                any = any.add(col.like(format!("%{search}%")));
            }
            cond = cond.add(any);
        }
    }

    Ok(cond)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::users;
    use serde_json::json;

    fn criterion(field: &str, operator: &str, value: serde_json::Value) -> FilterCriterion {
        FilterCriterion {
            field: field.to_string(),
            operator: operator.to_string(),
            value,
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("postal_code"), "postal_code");
        assert_eq!(normalize_path("postalCode"), "postal_code");
        assert_eq!(normalize_path("audit.deletedDate"), "audit.deleted_date");
        assert_eq!(normalize_path("  email "), "email");
    }

    #[test]
    fn test_empty_request_matches_everything() {
        let cond = build_condition::<users::Schema>("", &[]).unwrap();
        assert_eq!(cond, Condition::all());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let filters = [criterion("bogus", "eq", json!("x"))];
        assert!(matches!(
            build_condition::<users::Schema>("", &filters),
            Err(FilterError::UnknownField(_))
        ));
    }

    #[test]
    fn test_password_is_not_addressable() {
        let filters = [criterion("password", "eq", json!("secret"))];
        assert!(matches!(
            build_condition::<users::Schema>("", &filters),
            Err(FilterError::UnknownField(_))
        ));
    }

    #[test]
    fn test_like_on_non_text_field_is_rejected() {
        let filters = [criterion("postal_code", "like", json!("123"))];
        assert!(matches!(
            build_condition::<users::Schema>("", &filters),
            Err(FilterError::LikeOnNonText(_))
        ));
    }

    #[test]
    fn test_range_operator_on_boolean_is_rejected() {
        let filters = [criterion("audit.deleted", "gt", json!("false"))];
        assert!(matches!(
            build_condition::<users::Schema>("", &filters),
            Err(FilterError::NotOrdered { .. })
        ));
    }

    #[test]
    fn test_unsupported_operator_is_rejected() {
        let filters = [criterion("email", "between", json!("a"))];
        assert!(matches!(
            build_condition::<users::Schema>("", &filters),
            Err(FilterError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn test_bad_value_format_is_rejected() {
        let filters = [criterion("postal_code", "gte", json!("ten-thousand"))];
        assert!(matches!(
            build_condition::<users::Schema>("", &filters),
            Err(FilterError::Value(_))
        ));
    }

    #[test]
    fn test_operator_matching_is_case_insensitive() {
        let filters = [criterion("postal_code", "GTE", json!("10000"))];
        assert!(build_condition::<users::Schema>("", &filters).is_ok());
    }

    #[test]
    fn test_in_with_scalar_equals_singleton_list() {
        let scalar = [criterion("postal_code", "in", json!("12345"))];
        let list = [criterion("postal_code", "in", json!(["12345"]))];
        let built_scalar = build_condition::<users::Schema>("", &scalar).unwrap();
        let built_list = build_condition::<users::Schema>("", &list).unwrap();
        assert_eq!(built_scalar, built_list);
    }

    #[test]
    fn test_camel_case_path_resolves() {
        let filters = [criterion("postalCode", "gte", json!("10000"))];
        assert!(build_condition::<users::Schema>("", &filters).is_ok());
    }

    #[test]
    fn test_dotted_audit_path_resolves() {
        let filters = [criterion("audit.deleted", "eq", json!("false"))];
        assert!(build_condition::<users::Schema>("", &filters).is_ok());
    }

    #[test]
    fn test_search_adds_a_condition() {
        let with_search = build_condition::<users::Schema>("alice", &[]).unwrap();
        assert_ne!(with_search, Condition::all());

        let blank_search = build_condition::<users::Schema>("   ", &[]).unwrap();
        assert_eq!(blank_search, Condition::all());
    }
}
