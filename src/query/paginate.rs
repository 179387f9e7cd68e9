use sea_orm::{DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::filter::{FieldDef, FilterCriterion, FilterError, FilterSchema, build_condition,
    normalize_path};

/// A paged, sorted, filtered query request. Page numbering is 0-based.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort_by: String,
    pub sort_dir: String,
    pub search: String,
    pub filters: Vec<FilterCriterion>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort_by: String::new(),
            sort_dir: "asc".to_string(),
            search: String::new(),
            filters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub last: bool,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

/// Runs one paged, sorted, filtered query and maps each row into the
/// projection type `R`.
///
/// The sort field falls back to the entity's primary key when `sortBy` is
/// blank or does not resolve against the registry; this leniency is
/// deliberate and mirrors the sort-field validation of the original engine.
pub async fn paginate<S, R>(
    conn: &DatabaseConnection,
    request: &PageRequest,
) -> Result<PageResponse<R>, QueryError>
where
    S: FilterSchema,
    R: From<<S::Entity as EntityTrait>::Model>,
    <S::Entity as EntityTrait>::Model: Sync,
{
    if request.size == 0 {
        return Err(QueryError::ZeroPageSize);
    }

    let sort = resolve_sort_field::<S>(&request.sort_by);
    let order = if request.sort_dir.eq_ignore_ascii_case("asc") {
        Order::Asc
    } else {
        Order::Desc
    };

    let condition = build_condition::<S>(&request.search, &request.filters)?;

    let paginator = <S::Entity as EntityTrait>::find()
        .filter(condition)
        .order_by(sort.column, order)
        .paginate(conn, request.size);

    let totals = paginator.num_items_and_pages().await?;
    let rows = paginator.fetch_page(request.page).await?;

    let last = totals.number_of_items == 0 || request.page + 1 >= totals.number_of_pages;

    Ok(PageResponse {
        content: rows.into_iter().map(R::from).collect(),
        page: request.page,
        size: request.size,
        total_elements: totals.number_of_items,
        total_pages: totals.number_of_pages,
        last,
    })
}

fn resolve_sort_field<S: FilterSchema>(
    sort_by: &str,
) -> FieldDef<<S::Entity as EntityTrait>::Column> {
    let trimmed = sort_by.trim();
    if trimmed.is_empty() {
        return S::id_field();
    }
    S::resolve(&normalize_path(trimmed)).unwrap_or_else(S::id_field)
}
