//! HTTP API 测试 - 认证、错误码与订单状态机
//!
//! Run: cargo test -p store-server --test http_api
//!
//! Drives the full router (middleware included) over an in-memory
//! database with tower's oneshot, no sockets involved.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use store_server::auth::{JwtConfig, JwtService};
use store_server::core::{Config, ServerState, UserLocks, build_router};
use store_server::db::DbService;
use store_server::db::models::{ProductCreate, UserCreate};
use store_server::db::repository::{ProductRepository, UserRepository};

async fn test_state() -> ServerState {
    let db = DbService::memory().await.unwrap().db;
    let jwt_service = Arc::new(JwtService::with_config(JwtConfig {
        secret: "http-api-test-secret-key-0123456789abcdef".to_string(),
        expiration_minutes: 60,
        issuer: "store-server".to_string(),
        audience: "conch-clients".to_string(),
    }));
    let config = Config::with_overrides("/tmp/conch-http-api-test", 0);
    ServerState::new(config, db, jwt_service, Arc::new(UserLocks::new()))
}

async fn test_app() -> (ServerState, Router) {
    let state = test_state().await;
    let app = build_router(state.clone());
    (state, app)
}

/// Create an account directly and mint a token for it
async fn seed_account(state: &ServerState, email: &str, is_admin: bool) -> (String, String) {
    let repo = UserRepository::new(state.get_db());
    let user = repo
        .create(UserCreate {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            is_admin,
        })
        .await
        .unwrap();
    let id = user.id.as_ref().unwrap().to_string();
    let token = state
        .get_jwt_service()
        .generate_token(&id, &user.name, &user.email, user.is_admin)
        .unwrap();
    (id, token)
}

async fn seed_product(state: &ServerState, name: &str, price: f64, stock: i32) -> String {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .create(ProductCreate {
            name: name.to_string(),
            description: String::new(),
            price,
            image: String::new(),
            category: "general".to_string(),
            brand: String::new(),
            count_in_stock: stock,
        })
        .await
        .unwrap();
    product.id.unwrap().to_string()
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let req = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Create an address over the API, returning its id
async fn seed_address(app: &Router, token: &str) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/addresses",
        Some(token),
        Some(json!({
            "name": "Asha",
            "phone": "555-0101",
            "street": "12 Rose St",
            "city": "Mysore",
            "state": "KA",
            "postal_code": "570001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().unwrap().to_string()
}

fn order_payload(product_id: &str, address_id: &str, price: f64, quantity: i32) -> Value {
    json!({
        "items": [{
            "product_id": product_id,
            "name": "Kettle",
            "price": price,
            "quantity": quantity,
            "image": ""
        }],
        "address_id": address_id,
        "payment_method": "card:1111"
    })
}

// ==================== Auth ====================

#[tokio::test]
async fn test_health_is_public() {
    let (_state, app) = test_app().await;

    let (status, body) = request(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = request(&app, Method::GET, "/api/health/detailed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "ok");
}

#[tokio::test]
async fn test_register_login_me_roundtrip() {
    let (_state, app) = test_app().await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Asha",
            "email": "asha@example.com",
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert!(body["data"]["token"].as_str().unwrap().len() > 20);

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({
            "email": "asha@example.com",
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "asha@example.com");
    assert_eq!(body["data"]["is_admin"], false);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (state, app) = test_app().await;
    seed_account(&state, "locked@example.com", false).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({
            "email": "locked@example.com",
            "password": "wrong-password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (_state, app) = test_app().await;

    let (status, _) = request(&app, Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, Method::GET, "/api/orders/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The catalog read stays open
    let (status, body) = request(&app, Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);

    // Catalog writes do not
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/products",
        None,
        Some(json!({"name": "X", "price": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (_state, app) = test_app().await;
    let (status, _) = request(
        &app,
        Method::GET,
        "/api/cart",
        Some("not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ==================== Cart ====================

#[tokio::test]
async fn test_cart_flow_over_http() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "cart@example.com", false).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;

    // Add twice, same product merges into one line
    for quantity in [2, 3] {
        let (status, _) = request(
            &app,
            Method::POST,
            "/api/cart/items",
            Some(&token),
            Some(json!({"product_id": product, "quantity": quantity})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = request(&app, Method::GET, "/api/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["price"], 450.0);

    // Quantity below one is refused
    let (status, body) = request(
        &app,
        Method::PUT,
        &format!("/api/cart/items/{}", product),
        Some(&token),
        Some(json!({"quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3002);

    // Removing a product that was never added still succeeds
    let (status, _) = request(
        &app,
        Method::DELETE,
        "/api/cart/items/product:nonexistent",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, Method::DELETE, "/api/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_add_unknown_product_needs_price_hint() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "cart-hint@example.com", false).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/cart/items",
        Some(&token),
        Some(json!({"product_id": "product:ghost", "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 8001);

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/cart/items",
        Some(&token),
        Some(json!({
            "product_id": "product:ghost",
            "quantity": 1,
            "price_hint": 25.0,
            "name_hint": "Ghost Mug"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["name"], "Ghost Mug");
    assert_eq!(body["data"]["items"][0]["price"], 25.0);
}

#[tokio::test]
async fn test_cart_add_rejects_oversell() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "cart-stock@example.com", false).await;
    let product = seed_product(&state, "Rare Lamp", 600.0, 2).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/cart/items",
        Some(&token),
        Some(json!({"product_id": product, "quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 8002);
}

// ==================== Favorites ====================

#[tokio::test]
async fn test_favorites_error_codes() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "fav@example.com", false).await;
    let product = seed_product(&state, "Lamp", 600.0, 10).await;

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/favorites",
        Some(&token),
        Some(json!({"product_id": product})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/favorites",
        Some(&token),
        Some(json!({"product_id": product})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7001);

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/favorites/{}", product),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app,
        Method::DELETE,
        &format!("/api/favorites/{}", product),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 7002);
}

// ==================== Orders ====================

#[tokio::test]
async fn test_order_shipping_fee_boundaries() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "ship@example.com", false).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let address = seed_address(&app, &token).await;

    // 450 * 2 = 900, below the free-shipping line
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(order_payload(&product, &address, 450.0, 2)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subtotal"], 900.0);
    assert_eq!(body["data"]["shipping_fee"], 100.0);
    assert_eq!(body["data"]["total"], 1000.0);
    assert_eq!(body["data"]["status"], "PENDING");

    // 500 * 2 = 1000, exactly at the line ships free
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(order_payload(&product, &address, 500.0, 2)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["shipping_fee"], 0.0);
    assert_eq!(body["data"]["total"], 1000.0);
}

#[tokio::test]
async fn test_place_order_rejections() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "reject@example.com", false).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let address = seed_address(&app, &token).await;

    // Empty item list
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(json!({
            "items": [],
            "address_id": address,
            "payment_method": "card:1111"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);

    // Non-positive quantity on a line
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(order_payload(&product, &address, 450.0, 0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);

    // Unknown shipping address
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(order_payload(&product, "address:ghost", 450.0, 1)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);

    // Someone else's address reads as missing
    let (_id2, other_token) = seed_account(&state, "reject-other@example.com", false).await;
    let other_address = seed_address(&app, &other_token).await;
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(order_payload(&product, &other_address, 450.0, 1)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);
}

#[tokio::test]
async fn test_placing_an_order_leaves_the_cart_alone() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "cart-keep@example.com", false).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let address = seed_address(&app, &token).await;

    request(
        &app,
        Method::POST,
        "/api/cart/items",
        Some(&token),
        Some(json!({"product_id": product, "quantity": 2})),
    )
    .await;

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(order_payload(&product, &address, 450.0, 2)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app, Method::GET, "/api/cart", Some(&token), None).await;
    assert_eq!(
        body["data"]["items"].as_array().unwrap().len(),
        1,
        "checkout must not clear the cart"
    );
}

#[tokio::test]
async fn test_order_status_machine_over_http() {
    let (state, app) = test_app().await;
    let (_owner_id, owner) = seed_account(&state, "owner@example.com", false).await;
    let (_stranger_id, stranger) = seed_account(&state, "stranger@example.com", false).await;
    let (_admin_id, admin) = seed_account(&state, "admin@example.com", true).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let address = seed_address(&app, &owner).await;

    let (_, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&owner),
        Some(order_payload(&product, &address, 450.0, 1)),
    )
    .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/orders/{}/status", order_id);

    // Unknown value is its own error, checked before authorization
    let (status, body) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&stranger),
        Some(json!({"status": "REFUNDED"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);

    // A stranger cannot touch the order at all
    let (status, body) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&stranger),
        Some(json!({"status": "CANCELLED"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    // The owner cannot advance the flow
    let (status, body) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&owner),
        Some(json!({"status": "SHIPPED"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);

    // The admin can
    let (status, body) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&admin),
        Some(json!({"status": "PROCESSING"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PROCESSING");

    // The owner can still cancel while processing
    let (status, body) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&owner),
        Some(json!({"status": "CANCELLED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CANCELLED");

    // Terminal means terminal, admins included
    let (status, body) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&admin),
        Some(json!({"status": "PROCESSING"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 4005);
}

#[tokio::test]
async fn test_admin_may_skip_states_owner_may_not_cancel_late() {
    let (state, app) = test_app().await;
    let (_owner_id, owner) = seed_account(&state, "skip-owner@example.com", false).await;
    let (_admin_id, admin) = seed_account(&state, "skip-admin@example.com", true).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let address = seed_address(&app, &owner).await;

    let (_, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&owner),
        Some(order_payload(&product, &address, 450.0, 1)),
    )
    .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/orders/{}/status", order_id);

    // Straight from PENDING to SHIPPED
    let (status, _) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&admin),
        Some(json!({"status": "SHIPPED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Too late for the owner now
    let (status, body) = request(
        &app,
        Method::PUT,
        &status_uri,
        Some(&owner),
        Some(json!({"status": "CANCELLED"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 4005);
}

#[tokio::test]
async fn test_order_reads_mask_other_users() {
    let (state, app) = test_app().await;
    let (_owner_id, owner) = seed_account(&state, "mask-owner@example.com", false).await;
    let (_stranger_id, stranger) = seed_account(&state, "mask-stranger@example.com", false).await;
    let (_admin_id, admin) = seed_account(&state, "mask-admin@example.com", true).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let address = seed_address(&app, &owner).await;

    let (_, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&owner),
        Some(order_payload(&product, &address, 450.0, 1)),
    )
    .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    let order_uri = format!("/api/orders/{}", order_id);

    let (status, body) = request(&app, Method::GET, &order_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);

    let (status, _) = request(&app, Method::GET, &order_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, Method::GET, &order_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    // Listing is scoped to the caller
    let (_, body) = request(&app, Method::GET, "/api/orders/mine", Some(&stranger), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_listing_requires_admin() {
    let (state, app) = test_app().await;
    let (_id, member) = seed_account(&state, "list-member@example.com", false).await;
    let (_admin_id, admin) = seed_account(&state, "list-admin@example.com", true).await;

    let (status, body) = request(&app, Method::GET, "/api/orders", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2002);

    let (status, body) = request(&app, Method::GET, "/api/orders", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_array());
}

#[tokio::test]
async fn test_pay_records_the_gateway_result() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "pay@example.com", false).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let address = seed_address(&app, &token).await;

    let (_, body) = request(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(order_payload(&product, &address, 450.0, 1)),
    )
    .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/api/orders/{}/pay", order_id),
        Some(&token),
        Some(json!({
            "id": "gw-tx-42",
            "status": "COMPLETED",
            "update_time": "2026-08-22T10:00:00Z",
            "payer_email": "asha@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_result"]["id"], "gw-tx-42");
    assert_eq!(body["data"]["payment_result"]["status"], "COMPLETED");

    // A blank transaction id gets a generated one
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/api/orders/{}/pay", order_id),
        Some(&token),
        Some(json!({
            "id": "",
            "status": "COMPLETED",
            "update_time": "2026-08-22T10:05:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["payment_result"]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_review_flow_over_http() {
    let (state, app) = test_app().await;
    let (_id, token) = seed_account(&state, "review@example.com", false).await;
    let product = seed_product(&state, "Kettle", 450.0, 100).await;
    let review_uri = format!("/api/products/{}/reviews", product);

    let (status, body) = request(
        &app,
        Method::POST,
        &review_uri,
        Some(&token),
        Some(json!({"rating": 4.0, "comment": "Boils fast"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["num_reviews"], 1);
    assert_eq!(body["data"]["rating"], 4.0);

    // One review per user and product
    let (status, body) = request(
        &app,
        Method::POST,
        &review_uri,
        Some(&token),
        Some(json!({"rating": 5.0, "comment": "Still boils fast"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 8003);

    // Rating outside 1..=5
    let (status, _) = request(
        &app,
        Method::POST,
        &review_uri,
        Some(&token),
        Some(json!({"rating": 6.0, "comment": "!"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
