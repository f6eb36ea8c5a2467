use crate::handlers::common::{
    map_service_error, no_content_response, success_response, validate_input,
};
use crate::{errors::ApiError, services::UpsertLineInput, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart-view/", get(list_all_lines).post(upsert_line))
        .route("/cart-list/{cart_id}/", get(list_lines))
        .route("/cart-list/{cart_id}/{user_id}/", get(list_lines_for_user))
        .route("/cart-detail/{cart_id}/", get(cart_summary))
        .route(
            "/cart-detail/{cart_id}/{user_id}/",
            get(cart_summary_for_user),
        )
        .route("/cart-delete/{cart_id}/{item_id}/", delete(delete_line))
        .route(
            "/cart-delete/{cart_id}/{item_id}/{user_id}/",
            delete(delete_line_for_user),
        )
}

/// List every stored cart line
async fn list_all_lines(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let lines = state
        .services
        .cart
        .list_all_lines()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(lines))
}

/// Create or replace the line for (cart_id, product_id)
async fn upsert_line(
    State(state): State<AppState>,
    Json(payload): Json<UpsertLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpsertLineInput {
        cart_id: payload.cart_id,
        product_id: payload.product_id,
        user_id: payload.user_id,
        qty: payload.qty,
        price: payload.price,
        shipping_amount: payload.shipping_amount,
        country: payload.country,
        size: payload.size,
        color: payload.color,
    };

    let line = state
        .services
        .cart
        .upsert_line(input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(line))
}

/// List lines for a session
async fn list_lines(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state
        .services
        .cart
        .list_lines(&cart_id, None)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(lines))
}

/// List lines for a session restricted to an owning identity
async fn list_lines_for_user(
    State(state): State<AppState>,
    Path((cart_id, user_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state
        .services
        .cart
        .list_lines(&cart_id, Some(user_id))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(lines))
}

/// Aggregated totals for a session
async fn cart_summary(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .cart
        .summarize(&cart_id, None)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// Aggregated totals restricted to an owning identity
async fn cart_summary_for_user(
    State(state): State<AppState>,
    Path((cart_id, user_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .cart
        .summarize(&cart_id, Some(user_id))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// Remove one line from a session's cart
async fn delete_line(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart
        .delete_line(&cart_id, item_id, None)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Remove one line under the ownership rule
async fn delete_line_for_user(
    State(state): State<AppState>,
    Path((cart_id, item_id, user_id)): Path<(String, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart
        .delete_line(&cart_id, item_id, Some(user_id))
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertLineRequest {
    #[validate(length(min = 1))]
    pub cart_id: String,
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub qty: i32,
    pub price: Decimal,
    pub shipping_amount: Decimal,
    pub country: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}
