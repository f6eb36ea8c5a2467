use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState, PaginatedResponse};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

/// Creates the router for catalog endpoints
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/category/", get(list_categories))
        .route("/products/", get(list_products))
        .route("/products/{slug}/", get(product_detail))
}

#[derive(Debug, Deserialize)]
struct ProductListQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// List active categories
async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .catalog
        .list_categories()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}

/// List published products
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let (products, total) = state
        .services
        .catalog
        .list_products(query.page, limit)
        .await
        .map_err(map_service_error)?;

    let total_pages = total.div_ceil(limit);
    Ok(success_response(PaginatedResponse {
        items: products,
        total,
        page: query.page,
        limit,
        total_pages,
    }))
}

/// Single product by slug
async fn product_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .get_product_by_slug(&slug)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}
