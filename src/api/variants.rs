use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, VariantDto};
use crate::db::{NewVariant, VariantUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub product_id: i32,
    pub sku: Option<String>,
    pub name: String,
    pub attributes: Option<serde_json::Value>,
    pub price_override: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateVariantRequest {
    #[serde(default, deserialize_with = "super::double_option")]
    pub sku: Option<Option<String>>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub attributes: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub price_override: Option<Option<Decimal>>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

pub async fn list_variants(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<VariantDto>>>, ApiError> {
    if state.store().get_product(product_id).await?.is_none() {
        return Err(ApiError::not_found("Product", product_id));
    }

    let variants = state.store().list_variants_for_product(product_id).await?;
    let dtos: Vec<VariantDto> = variants.into_iter().map(VariantDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_variant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<VariantDto>>, ApiError> {
    let variant = state
        .store()
        .get_variant(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Variant", id))?;
    Ok(Json(ApiResponse::success(VariantDto::from(variant))))
}

pub async fn create_variant(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateVariantRequest>,
) -> Result<Json<ApiResponse<VariantDto>>, ApiError> {
    current.ensure_admin()?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Variant name is required"));
    }
    if payload.stock < 0 {
        return Err(ApiError::validation("Stock cannot be negative"));
    }
    if let Some(price) = payload.price_override
        && price < Decimal::ZERO
    {
        return Err(ApiError::validation("Price override cannot be negative"));
    }

    if state.store().get_product(payload.product_id).await?.is_none() {
        return Err(ApiError::not_found("Product", payload.product_id));
    }

    let attributes = payload
        .attributes
        .map(|v| serde_json::to_string(&v))
        .transpose()
        .map_err(|e| ApiError::validation(format!("Invalid attributes: {e}")))?;

    let variant = state
        .store()
        .create_variant(NewVariant {
            product_id: payload.product_id,
            sku: payload.sku,
            name: payload.name,
            attributes,
            price_override: payload.price_override,
            stock: payload.stock,
            is_active: payload.is_active,
        })
        .await?;

    Ok(Json(ApiResponse::success(VariantDto::from(variant))))
}

pub async fn update_variant(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateVariantRequest>,
) -> Result<Json<ApiResponse<VariantDto>>, ApiError> {
    current.ensure_admin()?;

    if let Some(stock) = payload.stock
        && stock < 0
    {
        return Err(ApiError::validation("Stock cannot be negative"));
    }

    let attributes = match payload.attributes {
        Some(Some(value)) => Some(Some(
            serde_json::to_string(&value)
                .map_err(|e| ApiError::validation(format!("Invalid attributes: {e}")))?,
        )),
        Some(None) => Some(None),
        None => None,
    };

    let variant = state
        .store()
        .update_variant(
            id,
            VariantUpdate {
                sku: payload.sku,
                name: payload.name,
                attributes,
                price_override: payload.price_override,
                stock: payload.stock,
                is_active: payload.is_active,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Variant", id))?;

    Ok(Json(ApiResponse::success(VariantDto::from(variant))))
}

pub async fn delete_variant(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    current.ensure_admin()?;

    let deleted = state.store().remove_variant(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Variant", id))
    }
}
