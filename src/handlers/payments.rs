use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

/// Creates the router for payment-gateway endpoints
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/stripe-checkout/{order_oid}/", post(begin_checkout))
        .route("/payment-success/{order_oid}/", post(confirm_payment))
}

/// Create a gateway checkout session and redirect to it
async fn begin_checkout(
    State(state): State<AppState>,
    Path(order_oid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let url = state
        .services
        .payment
        .begin_checkout(&order_oid)
        .await
        .map_err(map_service_error)?;

    Ok(Redirect::to(&url))
}

/// Confirm a payment by querying the gateway session
async fn confirm_payment(
    State(state): State<AppState>,
    Path(order_oid): Path<String>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .payment
        .confirm_payment(&order_oid, &payload.session_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "message": outcome.message(),
        "status": outcome,
    })))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1))]
    pub session_id: String,
}
