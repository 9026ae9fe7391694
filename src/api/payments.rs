use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, PaymentDto, RefundDto};

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub order_id: i32,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub payment_id: i32,
    pub client_secret: String,
    pub publishable_key: String,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub order_id: i32,
    pub amount: Decimal,
    pub reason: Option<String>,
}

/// POST /payments/create-intent
pub async fn create_intent(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<ApiResponse<CreateIntentResponse>>, ApiError> {
    let order = state
        .store()
        .get_order(payload.order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", payload.order_id))?;

    if !current.is_admin() && order.user_id != Some(current.id()) {
        return Err(ApiError::forbidden("You cannot pay for this order"));
    }

    let created = state.payments().create_intent(payload.order_id).await?;

    Ok(Json(ApiResponse::success(CreateIntentResponse {
        payment_id: created.payment.id,
        client_secret: created.client_secret,
        publishable_key: created.publishable_key,
    })))
}

/// POST /payments/webhook
/// Unauthenticated; trust is established by the provider signature over the
/// raw body, so this handler must see the bytes untouched.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::validation("Missing Stripe-Signature header"))?;

    state.payments().handle_webhook(&body, signature).await?;

    Ok(Json(ApiResponse::success("ok")))
}

/// POST /payments/refund (admin)
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<RefundRequest>,
) -> Result<Json<ApiResponse<RefundDto>>, ApiError> {
    current.ensure_admin()?;

    if payload.amount <= Decimal::ZERO {
        return Err(ApiError::validation("Refund amount must be positive"));
    }

    let refund = state
        .payments()
        .refund(
            payload.order_id,
            payload.amount,
            payload.reason.as_deref(),
            Some(current.id()),
        )
        .await?;

    Ok(Json(ApiResponse::success(RefundDto::from(refund))))
}

/// GET /payments/order/{order_id}
pub async fn list_for_order(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(order_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<PaymentDto>>>, ApiError> {
    ensure_order_visible(&state, &current, order_id).await?;

    let payments = state.store().list_payments_for_order(order_id).await?;
    let dtos: Vec<PaymentDto> = payments.into_iter().map(PaymentDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /payments/order/{order_id}/refunds
pub async fn list_refunds_for_order(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(order_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<RefundDto>>>, ApiError> {
    ensure_order_visible(&state, &current, order_id).await?;

    let refunds = state.store().list_refunds_for_order(order_id).await?;
    let dtos: Vec<RefundDto> = refunds.into_iter().map(RefundDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

async fn ensure_order_visible(
    state: &Arc<AppState>,
    current: &CurrentUser,
    order_id: i32,
) -> Result<(), ApiError> {
    let order = state
        .store()
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", order_id))?;

    if !current.is_admin() && order.user_id != Some(current.id()) {
        return Err(ApiError::forbidden("You cannot access this order"));
    }

    Ok(())
}
