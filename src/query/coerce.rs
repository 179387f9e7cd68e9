use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::Value;
use thiserror::Error;

/// Semantic type of a registered entity field, used as the coercion target
/// for untyped filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    BigInt,
    Float,
    Boolean,
    Date,
    DateTime,
    /// Escape hatch: values aimed at an `Opaque` field pass through
    /// unconverted. Kept deliberately permissive to match the original
    /// engine; no registered `users` field uses it.
    Opaque,
}

impl FieldKind {
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Whether range operators (`lt`/`lte`/`gt`/`gte`) apply to this kind.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        !matches!(self, Self::Boolean | Self::Opaque)
    }
}

/// A filter value that could not be converted to its field's declared type.
#[derive(Debug, Error)]
#[error("invalid filter value: {0}")]
pub struct CoerceError(pub String);

/// Converts a single untyped scalar to the statically-typed value `kind`
/// expects. Lists are handled by [`coerce_each`].
pub fn coerce(kind: FieldKind, raw: &serde_json::Value) -> Result<Value, CoerceError> {
    use serde_json::Value as Json;

    if raw.is_null() {
        return Err(CoerceError("filter value must not be null".into()));
    }
    if raw.is_array() || raw.is_object() {
        return Err(CoerceError(format!("expected a scalar value, got {raw}")));
    }

    match kind {
        FieldKind::Text => Ok(Value::from(coerce_text(raw)?)),
        FieldKind::Integer => {
            let text = coerce_text(raw)?;
            let parsed: i32 = text
                .parse()
                .map_err(|_| CoerceError(format!("'{text}' is not a valid integer")))?;
            Ok(Value::from(parsed))
        }
        FieldKind::BigInt => {
            let text = coerce_text(raw)?;
            let parsed: i64 = text
                .parse()
                .map_err(|_| CoerceError(format!("'{text}' is not a valid integer")))?;
            Ok(Value::from(parsed))
        }
        FieldKind::Float => {
            let text = coerce_text(raw)?;
            let parsed: f64 = text
                .parse()
                .map_err(|_| CoerceError(format!("'{text}' is not a valid number")))?;
            Ok(Value::from(parsed))
        }
        FieldKind::Boolean => {
            let text = coerce_text(raw)?;
            match text.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::from(true)),
                "false" => Ok(Value::from(false)),
                _ => Err(CoerceError(format!("'{text}' is not a valid boolean"))),
            }
        }
        FieldKind::Date => {
            let text = coerce_text(raw)?;
            let parsed: NaiveDate = text
                .parse()
                .map_err(|_| CoerceError(format!("'{text}' is not a valid ISO-8601 date")))?;
            Ok(Value::from(parsed))
        }
        FieldKind::DateTime => {
            let text = coerce_text(raw)?;
            let parsed: NaiveDateTime = text.parse().map_err(|_| {
                CoerceError(format!("'{text}' is not a valid ISO-8601 date-time"))
            })?;
            Ok(Value::from(parsed))
        }
        // Unsupported target type: hand the input back unchanged.
        FieldKind::Opaque => match raw {
            Json::String(s) => Ok(Value::from(s.clone())),
            Json::Bool(b) => Ok(Value::from(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::from(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::from(f))
                } else {
                    Err(CoerceError(format!("'{n}' is not a representable number")))
                }
            }
            _ => Err(CoerceError(format!("cannot pass through value {raw}"))),
        },
    }
}

/// Coerces every element of a list independently, preserving order. A scalar
/// input is treated as a singleton list.
pub fn coerce_each(kind: FieldKind, raw: &serde_json::Value) -> Result<Vec<Value>, CoerceError> {
    match raw {
        serde_json::Value::Array(items) => {
            items.iter().map(|item| coerce(kind, item)).collect()
        }
        scalar => Ok(vec![coerce(kind, scalar)?]),
    }
}

/// Stringifies a JSON scalar the way the text coercion does.
pub fn coerce_text(raw: &serde_json::Value) -> Result<String, CoerceError> {
    use serde_json::Value as Json;

    match raw {
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        Json::Bool(b) => Ok(b.to_string()),
        other => Err(CoerceError(format!("cannot stringify value {other}"))),
    }
}
