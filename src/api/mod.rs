use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{SqlUserService, UserService};
use crate::storage::ObjectStore;

mod error;
mod status;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub config: Config,

    pub start_time: std::time::Instant,
}

pub fn create_app_state(
    store: Store,
    storage: Arc<dyn ObjectStore>,
    config: Config,
) -> Arc<AppState> {
    let user_service = Arc::new(SqlUserService::new(
        store.clone(),
        storage,
        &config.upload,
        &config.storage,
    ));

    Arc::new(AppState {
        store,
        user_service,
        config,
        start_time: std::time::Instant::now(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let user_routes = Router::new()
        .route("/", post(users::create_user))
        .route("/", get(users::list_users))
        .route("/{id}", get(users::get_user))
        .route("/{id}", put(users::update_user))
        .route("/{id}", patch(users::patch_user))
        .route("/{id}", delete(users::delete_user))
        .route("/{id}/deactivate", patch(users::deactivate_user))
        .route("/{id}/activate", patch(users::activate_user))
        .route("/search", post(users::search_users))
        .route("/{id}/profile-image", post(users::upload_profile_image))
        .route("/{id}/profile-image", get(users::get_profile_image));

    let api_router = Router::new()
        .nest("/users", user_routes)
        .route("/status", get(status::get_status))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
