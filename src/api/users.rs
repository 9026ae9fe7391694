use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, Pagination, UserDto};
use crate::db::UserUpdate;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub password: Option<String>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    current.ensure_admin()?;

    let users = state.store().list_users(page.offset, page.limit).await?;
    let dtos: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    current.ensure_admin()?;

    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    current.ensure_admin()?;

    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(ApiError::validation("A valid email is required"));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    if state
        .store()
        .get_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "A user with email '{}' already exists",
            payload.email
        )));
    }

    let security = state.config().read().await.security.clone();
    let user = state
        .store()
        .create_user(
            &payload.email,
            payload.full_name.as_deref(),
            &payload.password,
            payload.is_admin,
            Some(&security),
        )
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    current.ensure_admin()?;

    if let Some(password) = &payload.password
        && password.len() < 6
    {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let update = UserUpdate {
        full_name: payload.full_name,
        is_active: payload.is_active,
        is_admin: payload.is_admin,
        password: payload.password,
    };

    let user = state
        .store()
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    current.ensure_admin()?;

    if current.id() == id {
        return Err(ApiError::validation("You cannot delete your own account"));
    }

    let deleted = state.store().remove_user(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("User", id))
    }
}
