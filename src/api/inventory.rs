use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MovementDto, ProductDto, VariantDto};
use crate::db::MovementFilter;

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
}

const fn default_limit() -> u64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    #[serde(default = "default_threshold")]
    pub threshold: i32,
}

const fn default_threshold() -> i32 {
    10
}

#[derive(Debug, Serialize)]
pub struct LowStockResponse {
    pub products: Vec<ProductDto>,
    pub variants: Vec<VariantDto>,
    pub threshold: i32,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub change: i32,
    pub reason: String,
    pub notes: Option<String>,
}

pub async fn list_movements(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<MovementQuery>,
) -> Result<Json<ApiResponse<Vec<MovementDto>>>, ApiError> {
    current.ensure_admin()?;

    let movements = state
        .store()
        .list_inventory_movements(
            MovementFilter {
                product_id: query.product_id,
                variant_id: query.variant_id,
            },
            query.offset,
            query.limit,
        )
        .await?;

    let dtos: Vec<MovementDto> = movements.into_iter().map(MovementDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn low_stock(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<ApiResponse<LowStockResponse>>, ApiError> {
    current.ensure_admin()?;

    if query.threshold < 0 {
        return Err(ApiError::validation("Threshold cannot be negative"));
    }

    let products = state.store().low_stock_products(query.threshold).await?;
    let variants = state.store().low_stock_variants(query.threshold).await?;

    Ok(Json(ApiResponse::success(LowStockResponse {
        products: products.into_iter().map(ProductDto::from).collect(),
        variants: variants.into_iter().map(VariantDto::from).collect(),
        threshold: query.threshold,
    })))
}

pub async fn adjust_product_stock(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(product_id): Path<i32>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<MovementDto>>, ApiError> {
    current.ensure_admin()?;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("A reason is required"));
    }

    let movement = state
        .store()
        .adjust_product_stock(
            product_id,
            payload.change,
            &payload.reason,
            payload.notes.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(MovementDto::from(movement))))
}

pub async fn adjust_variant_stock(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(variant_id): Path<i32>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<MovementDto>>, ApiError> {
    current.ensure_admin()?;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("A reason is required"));
    }

    let movement = state
        .store()
        .adjust_variant_stock(
            variant_id,
            payload.change,
            &payload.reason,
            payload.notes.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(MovementDto::from(movement))))
}
