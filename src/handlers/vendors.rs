use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    services::{CreateCouponInput, UpdateCouponInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for vendor administration endpoints
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/vendor/coupon-list/{vendor_id}/", get(list_coupons))
        .route("/vendor/coupon-create/", post(create_coupon))
        .route(
            "/vendor/coupon-detail/{vendor_id}/{coupon_id}/",
            get(coupon_detail)
                .put(update_coupon)
                .delete(delete_coupon),
        )
        .route(
            "/vendor/notifications-unseen/{vendor_id}/",
            get(unseen_notifications),
        )
        .route(
            "/vendor/notifications-seen/{vendor_id}/",
            get(seen_notifications),
        )
        .route(
            "/vendor/notifications-mark-seen/{vendor_id}/{noti_id}/",
            post(mark_notification_seen),
        )
}

/// A vendor's coupons
async fn list_coupons(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let coupons = state
        .services
        .coupon
        .list_for_vendor(vendor_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(coupons))
}

/// Create a coupon for a vendor
async fn create_coupon(
    State(state): State<AppState>,
    Json(payload): Json<CreateCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let coupon = state
        .services
        .coupon
        .create(CreateCouponInput {
            vendor_id: payload.vendor_id,
            code: payload.code,
            discount: payload.discount,
            active: payload.active,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(coupon))
}

/// Single coupon scoped to its vendor
async fn coupon_detail(
    State(state): State<AppState>,
    Path((vendor_id, coupon_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupon
        .get_for_vendor(vendor_id, coupon_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(coupon))
}

/// Update a vendor's coupon
async fn update_coupon(
    State(state): State<AppState>,
    Path((vendor_id, coupon_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupon
        .update(
            vendor_id,
            coupon_id,
            UpdateCouponInput {
                code: payload.code,
                discount: payload.discount,
                active: payload.active,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(coupon))
}

/// Delete a vendor's coupon
async fn delete_coupon(
    State(state): State<AppState>,
    Path((vendor_id, coupon_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .coupon
        .delete(vendor_id, coupon_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Unseen notifications for a vendor
async fn unseen_notifications(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .services
        .notification
        .list_for_vendor(vendor_id, false)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(notifications))
}

/// Seen notifications for a vendor
async fn seen_notifications(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .services
        .notification
        .list_for_vendor(vendor_id, true)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(notifications))
}

/// Mark a vendor notification as seen
async fn mark_notification_seen(
    State(state): State<AppState>,
    Path((vendor_id, noti_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .services
        .notification
        .mark_seen(vendor_id, noti_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(notification))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCouponRequest {
    pub vendor_id: Uuid,
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(range(min = 1, max = 100))]
    pub discount: i32,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCouponRequest {
    pub code: Option<String>,
    pub discount: Option<i32>,
    pub active: Option<bool>,
}
