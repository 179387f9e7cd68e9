use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, StatusDto};

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatusDto>>, ApiError> {
    let database = match state.store.ping().await {
        Ok(()) => "up".to_string(),
        Err(err) => {
            tracing::warn!("Database ping failed: {err:#}");
            "down".to_string()
        }
    };

    let status = StatusDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
    };

    Ok(Json(ApiResponse::success(status)))
}
