use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ProfileImageDto, validation};
use crate::query::{PageRequest, PageResponse};
use crate::services::{
    CreateUserRequest, PartialUpdateUserRequest, UpdateUserRequest, UserDto,
};

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_create_user(&request)?;

    let user = state.user_service.create(request).await?;
    let location = format!("/api/v1/users/{}", user.user_id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ApiResponse::success(user)),
    ))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.user_service.find_all().await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service.find_by_id(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    validation::validate_update_user(&request)?;

    let user = state.user_service.update(id, request).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn patch_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<PartialUpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    validation::validate_partial_update_user(&request)?;

    let user = state.user_service.partial_update(id, request).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.user_service.activate(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<UserDto>>>, ApiError> {
    let page = state.user_service.search(request).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn upload_profile_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ProfileImageDto>>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {}", e)))?;

        let image_url = state
            .user_service
            .upload_profile_image(id, &file_name, &content_type, data)
            .await?;

        return Ok(Json(ApiResponse::success(ProfileImageDto { image_url })));
    }

    Err(ApiError::validation("Missing multipart field 'file'"))
}

pub async fn get_profile_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProfileImageDto>>, ApiError> {
    let image_url = state.user_service.get_profile_image_url(id).await?;
    Ok(Json(ApiResponse::success(ProfileImageDto { image_url })))
}
