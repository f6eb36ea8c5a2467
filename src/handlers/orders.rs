use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::{errors::ApiError, services::CreateOrderInput, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for order endpoints
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order/", post(create_order))
        .route("/checkout/{order_oid}/", get(checkout_detail))
        .route("/orders/{user_id}/", get(list_buyer_orders))
        .route("/orders/{user_id}/{order_oid}/", get(buyer_order_detail))
}

/// Materialize an order from a cart
async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateOrderInput {
        cart_id: payload.cart_id,
        user_id: payload.user_id,
        full_name: payload.full_name,
        email: payload.email,
        mobile: payload.mobile,
        address: payload.address,
        city: payload.city,
        state: payload.state,
        country: payload.country,
    };

    let order = state
        .services
        .order
        .create_order(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(serde_json::json!({
        "message": "Order created successfully",
        "order_oid": order.oid,
    })))
}

/// Order with its item snapshots, for the checkout page
async fn checkout_detail(
    State(state): State<AppState>,
    Path(order_oid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_with_items = state
        .services
        .order
        .get_order_with_items(&order_oid)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order_with_items))
}

/// Paid orders for a buyer
async fn list_buyer_orders(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .order
        .list_paid_for_buyer(user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// Single paid order for a buyer
async fn buyer_order_detail(
    State(state): State<AppState>,
    Path((user_id, order_oid)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .order
        .get_paid_for_buyer(user_id, &order_oid)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub cart_id: String,
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub mobile: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub country: String,
}
