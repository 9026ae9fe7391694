use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, OrderDto, OrderEventDto, Pagination};
use crate::db::{NewOrder, OrderLine, OrderStatus, StatusChange};

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Admins may place an order on behalf of another user
    pub user_id: Option<i32>,
    pub shipping_address_id: Option<i32>,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<OrderDto>>>, ApiError> {
    // Admins see every order, everyone else only their own
    let user_filter = if current.is_admin() {
        None
    } else {
        Some(current.id())
    };

    let orders = state
        .store()
        .list_orders(user_filter, page.offset, page.limit)
        .await?;
    let dtos: Vec<OrderDto> = orders.into_iter().map(OrderDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDto>>, ApiError> {
    let details = state
        .store()
        .get_order_details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))?;

    if !current.is_admin() && details.order.user_id != Some(current.id()) {
        return Err(ApiError::forbidden("You cannot access this order"));
    }

    Ok(Json(ApiResponse::success(OrderDto::from(details))))
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<OrderDto>>, ApiError> {
    let user_id = match payload.user_id {
        Some(other) if other != current.id() => {
            current.ensure_admin()?;
            if state.store().get_user(other).await?.is_none() {
                return Err(ApiError::not_found("User", other));
            }
            Some(other)
        }
        _ => Some(current.id()),
    };

    if let Some(address_id) = payload.shipping_address_id {
        let address = state
            .store()
            .get_address(address_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Address", address_id))?;
        if !current.is_admin() && Some(address.user_id) != user_id {
            return Err(ApiError::forbidden(
                "Shipping address belongs to another user",
            ));
        }
    }

    let lines: Vec<OrderLine> = payload
        .items
        .iter()
        .map(|item| OrderLine {
            product_id: item.product_id,
            variant_id: item.variant_id,
            quantity: item.quantity,
        })
        .collect();

    let details = state
        .store()
        .create_order(NewOrder {
            user_id,
            shipping_address_id: payload.shipping_address_id,
            lines,
            actor_id: Some(current.id()),
            enforce_active: !current.is_admin(),
        })
        .await?;

    Ok(Json(ApiResponse::success(OrderDto::from(details))))
}

pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<OrderDto>>, ApiError> {
    current.ensure_admin()?;

    let status: OrderStatus = payload.status.parse()?;

    let details = state
        .store()
        .update_order_status(
            id,
            StatusChange {
                status,
                carrier: payload.carrier,
                tracking_number: payload.tracking_number,
                actor_id: Some(current.id()),
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(OrderDto::from(details))))
}

pub async fn list_order_events(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<OrderEventDto>>>, ApiError> {
    let order = state
        .store()
        .get_order(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))?;

    if !current.is_admin() && order.user_id != Some(current.id()) {
        return Err(ApiError::forbidden("You cannot access this order"));
    }

    let events = state.store().list_order_events(id).await?;
    let dtos: Vec<OrderEventDto> = events.into_iter().map(OrderEventDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}
