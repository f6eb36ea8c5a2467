mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use vendora_api::services::GatewaySessionStatus;

/// Monetary values serialize as JSON strings; parse before comparing so the
/// assertion is insensitive to trailing-zero scale.
fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected decimal value, got {:?}", other),
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .expect("request build"),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request build"),
    };

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("request should not fail at the transport level");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], "vendora-api");
}

#[tokio::test]
async fn test_product_detail_unknown_slug_is_404() {
    let app = TestApp::new().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/products/missing-product/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn test_catalog_lists_published_products() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(19.99), dec!(2.00)).await;
    app.seed_category("Electronics").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/products/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["pid"], Value::String(product.pid.clone()));

    let (status, body) = send(&app, Method::GET, "/api/v1/category/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/products/{}/", product.slug),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], Value::String(product.id.to_string()));
}

#[tokio::test]
async fn test_cart_upsert_and_summary_flow() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;
    app.seed_tax_rate("United Kingdom", 10).await;

    let payload = json!({
        "cart_id": "http-session",
        "product_id": product.id,
        "qty": 2,
        "price": "100.00",
        "shipping_amount": "5.00",
        "country": "United Kingdom",
        "size": "XL",
        "color": "black",
    });

    let (status, body) = send(&app, Method::POST, "/api/v1/cart-view/", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qty"], 2);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/cart-list/http-session/",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/cart-detail/http-session/",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&body["total"]), dec!(230.20));
    assert_eq!(decimal_field(&body["sub_total"]), dec!(200.00));
}

#[tokio::test]
async fn test_cart_upsert_rejects_zero_quantity() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;

    let payload = json!({
        "cart_id": "http-session",
        "product_id": product.id,
        "qty": 0,
        "price": "100.00",
        "shipping_amount": "5.00",
    });

    let (status, _body) = send(&app, Method::POST, "/api/v1/cart-view/", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_delete_endpoint() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(10.00), dec!(0.00)).await;

    let payload = json!({
        "cart_id": "http-session",
        "product_id": product.id,
        "qty": 1,
        "price": "10.00",
        "shipping_amount": "0.00",
    });
    let (_, line) = send(&app, Method::POST, "/api/v1/cart-view/", Some(payload)).await;
    let line_id = line["id"].as_str().expect("line id").to_string();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/cart-delete/http-session/{}/", line_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/cart-delete/http-session/{}/", line_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_checkout_and_coupon_flow_over_http() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;
    app.seed_tax_rate("United Kingdom", 10).await;
    app.seed_coupon(vendor.id, "SAVE20", 20, true).await;

    let payload = json!({
        "cart_id": "http-checkout",
        "product_id": product.id,
        "qty": 2,
        "price": "100.00",
        "shipping_amount": "5.00",
        "country": "United Kingdom",
    });
    let (status, _) = send(&app, Method::POST, "/api/v1/cart-view/", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);

    // Create the order
    let order_payload = json!({
        "cart_id": "http-checkout",
        "full_name": "Ada Lovelace",
        "email": "ada@example.com",
        "mobile": "+44 20 7946 0000",
        "address": "12 Analytical Row",
        "city": "London",
        "state": "Greater London",
        "country": "United Kingdom",
    });
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/create-order/",
        Some(order_payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let oid = body["order_oid"].as_str().expect("order oid").to_string();
    assert_eq!(oid.len(), 10);

    // Checkout page shows the order with its items
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/checkout/{}/", oid),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&body["order"]["total"]), dec!(230.20));
    assert_eq!(body["items"].as_array().map(|a| a.len()), Some(1));

    // Apply a coupon
    let coupon_payload = json!({
        "order_oid": oid,
        "coupon_code": "SAVE20",
    });
    let (status, body) = send(&app, Method::POST, "/api/v1/coupon/", Some(coupon_payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], true);
    assert_eq!(body["message"], "Coupon activated");

    // Second application reports already activated, still 200
    let coupon_payload = json!({
        "order_oid": oid,
        "coupon_code": "SAVE20",
    });
    let (status, body) = send(&app, Method::POST, "/api/v1/coupon/", Some(coupon_payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], false);
    assert_eq!(body["message"], "Coupon already activated");

    // Gateway redirect for checkout
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/stripe-checkout/{}/", oid))
        .body(Body::empty())
        .expect("request build");
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("request should not fail");
    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("https://gateway.test/session/"));

    // Confirm payment
    app.gateway.set_status(GatewaySessionStatus::Paid);
    let confirm_payload = json!({ "session_id": format!("cs_test_{}", oid) });
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/payment-success/{}/", oid),
        Some(confirm_payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment successful");

    // And a second confirmation is informational
    let confirm_payload = json!({ "session_id": format!("cs_test_{}", oid) });
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/payment-success/{}/", oid),
        Some(confirm_payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Already paid");
}

#[tokio::test]
async fn test_create_order_empty_cart_is_400_over_http() {
    let app = TestApp::new().await;

    let order_payload = json!({
        "cart_id": "never-used",
        "full_name": "Ada Lovelace",
        "email": "ada@example.com",
        "mobile": "+44 20 7946 0000",
        "address": "12 Analytical Row",
        "city": "London",
        "state": "Greater London",
        "country": "United Kingdom",
    });
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/create-order/",
        Some(order_payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vendor_coupon_administration_over_http() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;

    let create_payload = json!({
        "vendor_id": vendor.id,
        "code": "LAUNCH15",
        "discount": 15,
        "active": true,
    });
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/vendor/coupon-create/",
        Some(create_payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let coupon_id = body["id"].as_str().expect("coupon id").to_string();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/vendor/coupon-list/{}/", vendor.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/vendor/coupon-detail/{}/{}/", vendor.id, coupon_id),
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/vendor/coupon-detail/{}/{}/", vendor.id, coupon_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
