//! Generic filter/pagination engine.
//!
//! Turns untyped field/operator/value triples plus a free-text search term
//! into a single SeaORM [`Condition`](sea_orm::Condition), then runs one
//! paged, sorted query and maps rows into a projection type. Field paths are
//! resolved against a per-entity [`FilterSchema`] registry rather than
//! runtime reflection.

pub mod coerce;
pub mod filter;
pub mod paginate;

pub use coerce::{CoerceError, FieldKind, coerce, coerce_each, coerce_text};
pub use filter::{
    FieldDef, FilterCriterion, FilterError, FilterSchema, build_condition, normalize_path,
};
pub use paginate::{PageRequest, PageResponse, QueryError, paginate};
