//! Admin analytics route handlers.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;

use crate::middleware::{ApiQuery, RequireAdmin};
use crate::models::ProductSummary;
use crate::services::AnalyticsService;
use crate::services::analytics::{Period, RevenueBucket, Summary, TopProduct};
use crate::state::AppState;

use super::{ApiResult, ok};

const DEFAULT_TOP_LIMIT: usize = 5;
const MAX_TOP_LIMIT: usize = 100;
const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/revenue", get(revenue))
        .route("/top-products", get(top_products))
        .route("/low-stock", get(low_stock))
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<u32>,
}

async fn summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> ApiResult<Summary> {
    ok(AnalyticsService::new(&state).summary().await?)
}

async fn revenue(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<RevenueQuery>,
) -> ApiResult<Vec<RevenueBucket>> {
    ok(AnalyticsService::new(&state)
        .revenue_by_period(query.period)
        .await?)
}

async fn top_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<TopQuery>,
) -> ApiResult<Vec<TopProduct>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);
    ok(AnalyticsService::new(&state).top_products(limit).await?)
}

async fn low_stock(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> ApiResult<Vec<ProductSummary>> {
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    ok(AnalyticsService::new(&state).low_stock(threshold).await?)
}
