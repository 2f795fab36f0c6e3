//! Catalog route handlers.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;

use lakshmi_core::ProductId;

use crate::middleware::{ApiJson, ApiPath, ApiQuery, RequireUser};
use crate::models::{Product, ProductFilter, ProductSummary, Review};
use crate::services::CatalogService;
use crate::state::AppState;

use super::{ApiResult, ok, ok_with};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/list", get(list))
        .route("/{id}", get(detail))
        .route("/{id}/related", get(related))
        .route("/{id}/review/add", post(add_review))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub review: String,
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> ApiResult<Vec<ProductSummary>> {
    ok(CatalogService::new(&state).list_products(&filter).await?)
}

async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> ApiResult<Product> {
    ok(CatalogService::new(&state).get_product(id).await?)
}

async fn related(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> ApiResult<Vec<ProductSummary>> {
    ok(CatalogService::new(&state).related_to(id).await?)
}

async fn add_review(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> ApiResult<Review> {
    let review = CatalogService::new(&state)
        .add_review(id, &user, &body.review)
        .await?;
    ok_with(review, "Review added")
}
