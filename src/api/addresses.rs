use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{AddressDto, ApiError, ApiResponse, AppState, Pagination};
use crate::db::{AddressUpdate, NewAddress};

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    /// Admins may create addresses for another user
    pub user_id: Option<i32>,
    pub name: String,
    pub phone: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub phone: Option<Option<String>>,
    pub line1: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub line2: Option<Option<String>>,
    pub city: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub state: Option<Option<String>>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

/// Users list their own addresses; admins may list everything.
pub async fn list_addresses(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<AddressDto>>>, ApiError> {
    let addresses = if current.is_admin() {
        state
            .store()
            .list_all_addresses(page.offset, page.limit)
            .await?
    } else {
        state.store().list_addresses_for_user(current.id()).await?
    };

    let dtos: Vec<AddressDto> = addresses.into_iter().map(AddressDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_address(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AddressDto>>, ApiError> {
    let address = state
        .store()
        .get_address(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Address", id))?;

    if !current.is_admin() && address.user_id != current.id() {
        return Err(ApiError::forbidden("You cannot access this address"));
    }

    Ok(Json(ApiResponse::success(AddressDto::from(address))))
}

pub async fn create_address(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateAddressRequest>,
) -> Result<Json<ApiResponse<AddressDto>>, ApiError> {
    if payload.name.trim().is_empty()
        || payload.line1.trim().is_empty()
        || payload.city.trim().is_empty()
        || payload.postal_code.trim().is_empty()
    {
        return Err(ApiError::validation(
            "Name, line1, city and postal_code are required",
        ));
    }

    let user_id = match payload.user_id {
        Some(other) if other != current.id() => {
            current.ensure_admin()?;
            if state.store().get_user(other).await?.is_none() {
                return Err(ApiError::not_found("User", other));
            }
            other
        }
        _ => current.id(),
    };

    let address = state
        .store()
        .create_address(
            user_id,
            NewAddress {
                name: payload.name,
                phone: payload.phone,
                line1: payload.line1,
                line2: payload.line2,
                city: payload.city,
                state: payload.state,
                postal_code: payload.postal_code,
                country: payload.country,
                is_default: payload.is_default,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(AddressDto::from(address))))
}

pub async fn update_address(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAddressRequest>,
) -> Result<Json<ApiResponse<AddressDto>>, ApiError> {
    let address = state
        .store()
        .get_address(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Address", id))?;

    if !current.is_admin() && address.user_id != current.id() {
        return Err(ApiError::forbidden("You cannot modify this address"));
    }

    let updated = state
        .store()
        .update_address(
            id,
            AddressUpdate {
                name: payload.name,
                phone: payload.phone,
                line1: payload.line1,
                line2: payload.line2,
                city: payload.city,
                state: payload.state,
                postal_code: payload.postal_code,
                country: payload.country,
                is_default: payload.is_default,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Address", id))?;

    Ok(Json(ApiResponse::success(AddressDto::from(updated))))
}

pub async fn delete_address(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let address = state
        .store()
        .get_address(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Address", id))?;

    if !current.is_admin() && address.user_id != current.id() {
        return Err(ApiError::forbidden("You cannot delete this address"));
    }

    let deleted = state.store().remove_address(id).await?;
    Ok(Json(ApiResponse::success(deleted)))
}
