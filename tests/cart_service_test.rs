mod common;

use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;
use vendora_api::{errors::ServiceError, services::UpsertLineInput};

fn upsert_input(cart_id: &str, product_id: Uuid, qty: i32) -> UpsertLineInput {
    UpsertLineInput {
        cart_id: cart_id.to_string(),
        product_id,
        user_id: None,
        qty,
        price: dec!(100.00),
        shipping_amount: dec!(5.00),
        country: Some("United Kingdom".to_string()),
        size: Some("XL".to_string()),
        color: None,
    }
}

#[tokio::test]
async fn test_upsert_line_computes_derived_fields() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;
    app.seed_tax_rate("United Kingdom", 10).await;

    // price=100.00, qty=2, shipping=5.00, tax rate 10%
    let line = app
        .state
        .services
        .cart
        .upsert_line(upsert_input("session-1", product.id, 2))
        .await
        .expect("upsert should succeed");

    assert_eq!(line.sub_total.round_dp(2), dec!(200.00));
    assert_eq!(line.shipping_amount.round_dp(2), dec!(10.00));
    assert_eq!(line.tax_fee.round_dp(2), dec!(0.20));
    assert_eq!(line.service_fee.round_dp(2), dec!(20.00));
    assert_eq!(line.total.round_dp(2), dec!(230.20));
}

#[tokio::test]
async fn test_upsert_line_unknown_country_taxed_at_zero() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;

    let line = app
        .state
        .services
        .cart
        .upsert_line(upsert_input("session-1", product.id, 2))
        .await
        .expect("upsert should succeed");

    assert_eq!(line.tax_fee, Decimal::ZERO);
    assert_eq!(line.total.round_dp(2), dec!(230.00));
}

#[tokio::test]
async fn test_upsert_twice_replaces_line_in_place() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;

    let first = app
        .state
        .services
        .cart
        .upsert_line(upsert_input("session-1", product.id, 1))
        .await
        .expect("first upsert should succeed");

    let second = app
        .state
        .services
        .cart
        .upsert_line(upsert_input("session-1", product.id, 3))
        .await
        .expect("second upsert should succeed");

    // The second call overwrites the first; no duplicate line appears
    assert_eq!(first.id, second.id);
    assert_eq!(second.qty, 3);

    let lines = app
        .state
        .services
        .cart
        .list_lines("session-1", None)
        .await
        .expect("list should succeed");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].sub_total.round_dp(2), dec!(300.00));
}

#[tokio::test]
async fn test_upsert_unknown_product_fails_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .cart
        .upsert_line(upsert_input("session-1", Uuid::new_v4(), 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_upsert_non_positive_quantity_fails_invalid_input() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;

    let err = app
        .state
        .services
        .cart
        .upsert_line(upsert_input("session-1", product.id, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_summarize_empty_cart_is_zero_filled() {
    let app = TestApp::new().await;

    let summary = app
        .state
        .services
        .cart
        .summarize("no-such-session", None)
        .await
        .expect("empty summary is not an error");

    assert_eq!(summary.sub_total, Decimal::ZERO);
    assert_eq!(summary.shipping_amount, Decimal::ZERO);
    assert_eq!(summary.tax_fee, Decimal::ZERO);
    assert_eq!(summary.service_fee, Decimal::ZERO);
    assert_eq!(summary.total, Decimal::ZERO);
}

#[tokio::test]
async fn test_summarize_sums_across_lines() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product_a = app.seed_product(vendor.id, dec!(100.00), dec!(5.00)).await;
    let product_b = app.seed_product(vendor.id, dec!(20.00), dec!(1.00)).await;

    app.state
        .services
        .cart
        .upsert_line(upsert_input("session-1", product_a.id, 2))
        .await
        .expect("upsert a");
    app.state
        .services
        .cart
        .upsert_line(UpsertLineInput {
            price: dec!(20.00),
            shipping_amount: dec!(1.00),
            ..upsert_input("session-1", product_b.id, 1)
        })
        .await
        .expect("upsert b");

    let summary = app
        .state
        .services
        .cart
        .summarize("session-1", None)
        .await
        .expect("summary should succeed");

    // line a: 200 + 10 + 20 + 0 = 230; line b: 20 + 1 + 2 + 0 = 23
    assert_eq!(summary.sub_total.round_dp(2), dec!(220.00));
    assert_eq!(summary.shipping_amount.round_dp(2), dec!(11.00));
    assert_eq!(summary.service_fee.round_dp(2), dec!(22.00));
    assert_eq!(summary.total.round_dp(2), dec!(253.00));
}

#[tokio::test]
async fn test_get_line_enforces_ownership() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(10.00), dec!(0.00)).await;
    let owner = Uuid::new_v4();

    let line = app
        .state
        .services
        .cart
        .upsert_line(UpsertLineInput {
            user_id: Some(owner),
            price: dec!(10.00),
            shipping_amount: dec!(0.00),
            ..upsert_input("session-1", product.id, 1)
        })
        .await
        .expect("upsert should succeed");

    // Owner sees the line
    app.state
        .services
        .cart
        .get_line("session-1", line.id, Some(owner))
        .await
        .expect("owner lookup should succeed");

    // A different identity does not
    let err = app
        .state
        .services
        .cart
        .get_line("session-1", line.id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_line_removes_and_second_delete_fails() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("Acme").await;
    let product = app.seed_product(vendor.id, dec!(10.00), dec!(0.00)).await;

    let line = app
        .state
        .services
        .cart
        .upsert_line(upsert_input("session-1", product.id, 1))
        .await
        .expect("upsert should succeed");

    app.state
        .services
        .cart
        .delete_line("session-1", line.id, None)
        .await
        .expect("delete should succeed");

    let err = app
        .state
        .services
        .cart
        .delete_line("session-1", line.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let lines = app
        .state
        .services
        .cart
        .list_lines("session-1", None)
        .await
        .expect("list should succeed");
    assert!(lines.is_empty());
}
