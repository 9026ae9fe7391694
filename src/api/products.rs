use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, Pagination, ProductDto};
use crate::db::{NewProduct, ProductUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub category_id: Option<i32>,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    /// Present-and-null clears the category
    #[serde(default, deserialize_with = "super::double_option")]
    pub category_id: Option<Option<i32>>,
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<ProductDto>>>, ApiError> {
    // Non-admin callers only see active catalog entries
    let active_only = !current.is_admin();

    let products = state
        .store()
        .list_products(page.offset, page.limit, active_only)
        .await?;
    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let product = state
        .store()
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    Ok(Json(ApiResponse::success(ProductDto::from(product))))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    current.ensure_admin()?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Product name is required"));
    }
    if payload.price < Decimal::ZERO {
        return Err(ApiError::validation("Price cannot be negative"));
    }
    if payload.stock < 0 {
        return Err(ApiError::validation("Stock cannot be negative"));
    }

    if let Some(category_id) = payload.category_id
        && state.store().get_category(category_id).await?.is_none()
    {
        return Err(ApiError::not_found("Category", category_id));
    }

    let product = state
        .store()
        .create_product(NewProduct {
            name: payload.name,
            description: payload.description,
            price: payload.price,
            stock: payload.stock,
            is_active: payload.is_active,
            category_id: payload.category_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProductDto::from(product))))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    current.ensure_admin()?;

    if let Some(price) = payload.price
        && price < Decimal::ZERO
    {
        return Err(ApiError::validation("Price cannot be negative"));
    }
    if let Some(stock) = payload.stock
        && stock < 0
    {
        return Err(ApiError::validation("Stock cannot be negative"));
    }

    let product = state
        .store()
        .update_product(
            id,
            ProductUpdate {
                name: payload.name,
                description: payload.description,
                price: payload.price,
                stock: payload.stock,
                is_active: payload.is_active,
                category_id: payload.category_id,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(ApiResponse::success(ProductDto::from(product))))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    current.ensure_admin()?;

    let deleted = state.store().remove_product(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Product", id))
    }
}
