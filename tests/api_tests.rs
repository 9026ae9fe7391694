use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use vendora::config::Config;

/// Default API key seeded by migration (must match m20240102_seed_admin.rs)
const DEFAULT_API_KEY: &str = "vendora_default_api_key_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();

    let state = vendora::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    vendora::api::router(state).await
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, json: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(json).unwrap()))
        .unwrap()
}

fn put_json(uri: &str, json: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(json).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/system/status")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/api/v1/system/status"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_seeded_admin() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": "admin@example.com",
                        "password": "changeme"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "admin@example.com");
    assert_eq!(json["data"]["is_admin"], true);
    assert_eq!(json["data"]["api_key"], DEFAULT_API_KEY);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": "admin@example.com",
                        "password": "not-the-password"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_crud() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/categories",
            &serde_json::json!({ "name": "Shoes", "description": "Footwear" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["name"], "Shoes");

    // Duplicate name conflicts
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/categories",
            &serde_json::json!({ "name": "Shoes" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/v1/categories/{id}"),
            &serde_json::json!({ "description": "All footwear" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/categories/{id}")))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["description"], "All footwear");

    let response = app.oneshot(get("/api/v1/categories")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_product_crud() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/products",
            &serde_json::json!({
                "name": "Widget",
                "description": "A widget",
                "price": "19.99",
                "stock": 25
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["price"], "19.99");
    assert_eq!(json["data"]["stock"], 25);
    assert_eq!(json["data"]["is_active"], true);

    // Negative price is rejected
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/products",
            &serde_json::json!({ "name": "Bad", "price": "-1.00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/v1/products/{id}"),
            &serde_json::json!({ "price": "24.99", "is_active": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["price"], "24.99");
    assert_eq!(json["data"]["is_active"], false);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/products/{id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/api/v1/products/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_flow_over_http() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/products",
            &serde_json::json!({ "name": "Gadget", "price": "100.00", "stock": 10 }),
        ))
        .await
        .unwrap();
    let product_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Ordering 3 units of a 100.00 product with stock 10 yields 300.00 and stock 7
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/orders",
            &serde_json::json!({
                "items": [ { "product_id": product_id, "quantity": 3 } ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let order_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["total_amount"], "300.00");
    assert_eq!(json["data"]["items"][0]["unit_price"], "100.00");
    assert_eq!(json["data"]["events"][0]["event_type"], "created");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/products/{product_id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["stock"], 7);

    // Requesting more than available fails and the stock stays put
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/orders",
            &serde_json::json!({
                "items": [ { "product_id": product_id, "quantity": 100 } ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/products/{product_id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["stock"], 7);

    // pending -> paid appends exactly one event and leaves prices alone
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/v1/orders/{order_id}/status"),
            &serde_json::json!({ "status": "paid" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "paid");
    assert_eq!(json["data"]["events"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["items"][0]["unit_price"], "100.00");

    // Unknown status strings are rejected
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/v1/orders/{order_id}/status"),
            &serde_json::json!({ "status": "teleported" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Ledger shows exactly one movement for the order line
    let response = app
        .oneshot(get(&format!(
            "/api/v1/inventory/movements?product_id={product_id}"
        )))
        .await
        .unwrap();
    let json = body_json(response).await;
    let movements = json["data"].as_array().unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["change"], -3);
    assert_eq!(movements[0]["reason"], "order");
    assert_eq!(movements[0]["ref_order_id"], order_id);
}

#[tokio::test]
async fn test_stock_adjustment_endpoint() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/products",
            &serde_json::json!({ "name": "Bolt", "price": "1.50", "stock": 3 }),
        ))
        .await
        .unwrap();
    let product_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Going below zero is rejected
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/inventory/adjust/product/{product_id}"),
            &serde_json::json!({ "change": -5, "reason": "damage" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/inventory/adjust/product/{product_id}"),
            &serde_json::json!({ "change": 7, "reason": "restock" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["change"], 7);
    assert_eq!(json["data"]["reason"], "restock");

    let response = app
        .oneshot(get(&format!("/api/v1/products/{product_id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["stock"], 10);
}

#[tokio::test]
async fn test_non_admin_is_forbidden_from_admin_surfaces() {
    let app = spawn_app().await;

    // Create a regular user, then act with their key
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/users",
            &serde_json::json!({
                "email": "shopper@example.com",
                "password": "hunter22"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": "shopper@example.com",
                        "password": "hunter22"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let user_key = body_json(response).await["data"]["api_key"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/stats/overview")
                .header("X-Api-Key", &user_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/products")
                .header("X-Api-Key", &user_key)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "name": "Nope", "price": "1.00" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stats_overview() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/products",
            &serde_json::json!({ "name": "Thing", "price": "50.00", "stock": 4 }),
        ))
        .await
        .unwrap();
    let product_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/orders",
            &serde_json::json!({
                "items": [ { "product_id": product_id, "quantity": 2 } ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/v1/stats/overview")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_orders"], 1);
    assert!((json["data"]["total_revenue"].as_f64().unwrap() - 100.0).abs() < 1e-6);
    assert_eq!(json["data"]["active_products"], 1);
}
