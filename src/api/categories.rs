use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, CategoryDto};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let categories = state.store().list_categories().await?;
    let dtos: Vec<CategoryDto> = categories.into_iter().map(CategoryDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let category = state
        .store()
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;
    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    current.ensure_admin()?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Category name is required"));
    }

    if state
        .store()
        .get_category_by_name(&payload.name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Category '{}' already exists",
            payload.name
        )));
    }

    let category = state
        .store()
        .create_category(&payload.name, payload.description.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    current.ensure_admin()?;

    let category = state
        .store()
        .update_category(id, payload.name.as_deref(), payload.description.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;

    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    current.ensure_admin()?;

    let deleted = state.store().remove_category(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Category", id))
    }
}
