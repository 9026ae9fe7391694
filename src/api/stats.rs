use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct OverviewDto {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub active_users: i64,
    pub active_products: i64,
}

#[derive(Debug, Serialize)]
pub struct SalesPointDto {
    pub date: String,
    pub revenue: f64,
    pub order_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TopProductDto {
    pub product_id: i32,
    pub product_name: String,
    pub total_revenue: f64,
    pub total_quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct TopProductsQuery {
    #[serde(default = "default_top_limit")]
    pub limit: u64,
}

const fn default_top_limit() -> u64 {
    10
}

/// GET /stats/overview
pub async fn overview(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<OverviewDto>>, ApiError> {
    current.ensure_admin()?;

    let row = state.store().stats_overview().await?;
    Ok(Json(ApiResponse::success(OverviewDto {
        total_revenue: row.total_revenue,
        total_orders: row.total_orders,
        active_users: row.active_users,
        active_products: row.active_products,
    })))
}

/// GET /stats/sales?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
pub async fn sales_trend(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<SalesQuery>,
) -> Result<Json<ApiResponse<Vec<SalesPointDto>>>, ApiError> {
    current.ensure_admin()?;

    for date in [&query.start_date, &query.end_date] {
        if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(ApiError::validation(format!(
                "Invalid date '{date}', expected YYYY-MM-DD"
            )));
        }
    }

    let points = state
        .store()
        .sales_trend(&query.start_date, &query.end_date)
        .await?;

    let dtos: Vec<SalesPointDto> = points
        .into_iter()
        .map(|p| SalesPointDto {
            date: p.date,
            revenue: p.revenue,
            order_count: p.order_count,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /stats/top-products
pub async fn top_products(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<TopProductsQuery>,
) -> Result<Json<ApiResponse<Vec<TopProductDto>>>, ApiError> {
    current.ensure_admin()?;

    let limit = query.limit.clamp(1, 100);
    let rows = state.store().top_products(limit).await?;

    let dtos: Vec<TopProductDto> = rows
        .into_iter()
        .map(|r| TopProductDto {
            product_id: r.product_id,
            product_name: r.product_name,
            total_revenue: r.total_revenue,
            total_quantity: r.total_quantity,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}
