use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

mod addresses;
pub mod auth;
mod categories;
mod error;
mod images;
mod inventory;
mod observability;
mod orders;
mod payments;
mod products;
mod stats;
mod system;
mod types;
mod users;
mod variants;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn payments(&self) -> &Arc<crate::services::PaymentService> {
        &self.shared.payment_service
    }

    #[must_use]
    pub fn uploads(&self) -> &Arc<crate::services::UploadService> {
        &self.shared.upload_service
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (upload_dir, cors_origins, secure_cookies, session_idle_minutes) = {
        let config = state.config().read().await;
        (
            config.uploads.upload_dir.clone(),
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_idle_minutes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_idle_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/payments/webhook", post(payments::webhook))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/health", get(system::health))
        .nest("/api/v1", api_router)
        .nest_service("/uploads", tower_http::services::ServeDir::new(upload_dir))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", get(auth::get_api_key))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/categories", get(categories::list_categories))
        .route("/categories", post(categories::create_category))
        .route("/categories/{id}", get(categories::get_category))
        .route("/categories/{id}", put(categories::update_category))
        .route("/categories/{id}", delete(categories::delete_category))
        .route("/products", get(products::list_products))
        .route("/products", post(products::create_product))
        .route("/products/{id}", get(products::get_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}", delete(products::delete_product))
        .route("/products/{id}/variants", get(variants::list_variants))
        .route("/products/{id}/images", get(images::list_product_images))
        .route("/variants", post(variants::create_variant))
        .route("/variants/{id}", get(variants::get_variant))
        .route("/variants/{id}", put(variants::update_variant))
        .route("/variants/{id}", delete(variants::delete_variant))
        .route("/images/upload", post(images::upload_image))
        .route("/images/{id}", delete(images::delete_image))
        .route("/addresses", get(addresses::list_addresses))
        .route("/addresses", post(addresses::create_address))
        .route("/addresses/{id}", get(addresses::get_address))
        .route("/addresses/{id}", put(addresses::update_address))
        .route("/addresses/{id}", delete(addresses::delete_address))
        .route("/orders", get(orders::list_orders))
        .route("/orders", post(orders::create_order))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/status", put(orders::update_order_status))
        .route("/orders/{id}/events", get(orders::list_order_events))
        .route("/inventory/movements", get(inventory::list_movements))
        .route("/inventory/low-stock", get(inventory::low_stock))
        .route(
            "/inventory/adjust/product/{id}",
            post(inventory::adjust_product_stock),
        )
        .route(
            "/inventory/adjust/variant/{id}",
            post(inventory::adjust_variant_stock),
        )
        .route("/payments/create-intent", post(payments::create_intent))
        .route("/payments/refund", post(payments::refund))
        .route("/payments/order/{id}", get(payments::list_for_order))
        .route(
            "/payments/order/{id}/refunds",
            get(payments::list_refunds_for_order),
        )
        .route("/stats/overview", get(stats::overview))
        .route("/stats/sales", get(stats::sales_trend))
        .route("/stats/top-products", get(stats::top_products))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// Distinguishes an absent field from an explicit null in PATCH-style
/// payloads: `Some(None)` clears the column.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
