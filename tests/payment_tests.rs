use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tower::ServiceExt;
use vendora::clients::stripe::sign_webhook_payload;
use vendora::config::Config;
use vendora::db::{NewOrder, NewProduct, OrderLine, Store};
use vendora::state::SharedState;

const WEBHOOK_SECRET: &str = "whsec_test_secret";
const DEFAULT_API_KEY: &str = "vendora_default_api_key_please_regenerate";

async fn spawn_app_with_store() -> (Router, Store) {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.stripe.enabled = true;
    config.stripe.secret_key = "sk_test_123".to_string();
    config.stripe.publishable_key = "pk_test_123".to_string();
    config.stripe.webhook_secret = WEBHOOK_SECRET.to_string();

    let shared = Arc::new(SharedState::new(config).await.expect("shared state"));
    let store = shared.store.clone();
    let state = vendora::api::create_app_state(shared, None);
    (vendora::api::router(state).await, store)
}

/// Seed a product, a pending order for it, and a pending payment row keyed
/// by `intent_id`.
async fn seed_pending_order(store: &Store, intent_id: &str) -> i32 {
    let product = store
        .create_product(NewProduct {
            name: "Webhook product".to_string(),
            description: None,
            price: "100.00".parse::<Decimal>().unwrap(),
            stock: 10,
            is_active: true,
            category_id: None,
        })
        .await
        .unwrap();

    let details = store
        .create_order(NewOrder {
            user_id: None,
            shipping_address_id: None,
            lines: vec![OrderLine {
                product_id: product.id,
                variant_id: None,
                quantity: 3,
            }],
            actor_id: None,
            enforce_active: true,
        })
        .await
        .unwrap();

    store
        .create_payment(
            details.order.id,
            details.order.total_amount,
            "usd",
            Some(intent_id),
            "stripe",
        )
        .await
        .unwrap();

    details.order.id
}

fn webhook_request(payload: &serde_json::Value, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/payments/webhook")
        .header("Stripe-Signature", signature)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(payload).unwrap()))
        .unwrap()
}

fn signed_webhook_request(payload: &serde_json::Value) -> Request<Body> {
    let body = serde_json::to_string(payload).unwrap();
    let signature = sign_webhook_payload(
        body.as_bytes(),
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
    );
    webhook_request(payload, &signature)
}

#[tokio::test]
async fn test_webhook_success_transitions_order_exactly_once() {
    let (app, store) = spawn_app_with_store().await;
    let order_id = seed_pending_order(&store, "pi_success_1").await;

    let payload = serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_success_1" } }
    });

    let response = app
        .clone()
        .oneshot(signed_webhook_request(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, "paid");

    let payments = store.list_payments_for_order(order_id).await.unwrap();
    assert_eq!(payments[0].status, "succeeded");

    let events = store.list_order_events(order_id).await.unwrap();
    let paid_events: Vec<_> = events.iter().filter(|e| e.event_type == "paid").collect();
    assert_eq!(paid_events.len(), 1);

    // Duplicate delivery: payment update is idempotent and the order
    // transitions only once
    let response = app
        .oneshot(signed_webhook_request(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, "paid");

    let events = store.list_order_events(order_id).await.unwrap();
    let paid_events: Vec<_> = events.iter().filter(|e| e.event_type == "paid").collect();
    assert_eq!(paid_events.len(), 1);
}

#[tokio::test]
async fn test_webhook_failure_marks_payment_failed() {
    let (app, store) = spawn_app_with_store().await;
    let order_id = seed_pending_order(&store, "pi_fail_1").await;

    let payload = serde_json::json!({
        "type": "payment_intent.payment_failed",
        "data": { "object": { "id": "pi_fail_1" } }
    });

    let response = app
        .oneshot(signed_webhook_request(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payments = store.list_payments_for_order(order_id).await.unwrap();
    assert_eq!(payments[0].status, "failed");

    // The order stays pending on failure
    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, "pending");
}

#[tokio::test]
async fn test_webhook_rejects_invalid_signature() {
    let (app, store) = spawn_app_with_store().await;
    let order_id = seed_pending_order(&store, "pi_forged_1").await;

    let payload = serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_forged_1" } }
    });

    let signature = sign_webhook_payload(
        serde_json::to_string(&payload).unwrap().as_bytes(),
        "whsec_wrong_secret",
        chrono::Utc::now().timestamp(),
    );

    let response = app
        .clone()
        .oneshot(webhook_request(&payload, &signature))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing header is also rejected
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/webhook")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, "pending");
}

#[tokio::test]
async fn test_webhook_for_unknown_intent_is_acknowledged() {
    let (app, _store) = spawn_app_with_store().await;

    let payload = serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_nobody_knows" } }
    });

    let response = app
        .oneshot(signed_webhook_request(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refund_rejected_for_pending_order() {
    let (app, store) = spawn_app_with_store().await;
    let order_id = seed_pending_order(&store, "pi_refund_1").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/refund")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "order_id": order_id,
                        "amount": "300.00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_intent_rejected_for_paid_order() {
    let (app, store) = spawn_app_with_store().await;
    let order_id = seed_pending_order(&store, "pi_paid_1").await;

    store
        .mark_order_paid_if_pending(order_id, "Payment received")
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/create-intent")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "order_id": order_id }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
}
