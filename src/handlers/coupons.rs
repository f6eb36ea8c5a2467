use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{errors::ApiError, services::ApplyCouponOutcome, AppState};
use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for the coupon application endpoint
pub fn coupon_routes() -> Router<AppState> {
    Router::new().route("/coupon/", post(apply_coupon))
}

/// Apply a coupon code to an order
async fn apply_coupon(
    State(state): State<AppState>,
    Json(payload): Json<ApplyCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .coupon
        .apply_coupon(&payload.order_oid, &payload.coupon_code, payload.user_id)
        .await
        .map_err(map_service_error)?;

    let applied = matches!(outcome, ApplyCouponOutcome::Applied { .. });
    Ok(success_response(serde_json::json!({
        "message": outcome.message(),
        "applied": applied,
        "outcome": outcome,
    })))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1))]
    pub order_oid: String,
    #[validate(length(min = 1))]
    pub coupon_code: String,
    pub user_id: Option<Uuid>,
}
