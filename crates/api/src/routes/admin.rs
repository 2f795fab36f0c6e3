//! Admin catalog management.

use axum::{Router, extract::State, routing::post};
use serde::Deserialize;

use lakshmi_core::ProductId;

use crate::middleware::{ApiJson, RequireAdmin};
use crate::models::{NewProduct, Product};
use crate::services::CatalogService;
use crate::state::AppState;

use super::{ApiResult, done, ok_with};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/product/add", post(add_product))
        .route("/product/stock", post(set_stock))
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    pub stock: i64,
}

async fn add_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<NewProduct>,
) -> ApiResult<Product> {
    tracing::info!(admin_id = %admin.id, "Admin adding product");
    let product = CatalogService::new(&state).create_product(body).await?;
    ok_with(product, "Product added")
}

async fn set_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<StockRequest>,
) -> ApiResult<()> {
    tracing::info!(admin_id = %admin.id, product_id = %body.product_id, stock = body.stock, "Admin setting stock");
    CatalogService::new(&state)
        .set_stock(body.product_id, body.stock)
        .await?;
    done("Stock updated")
}
