//! Order route handlers.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;

use lakshmi_core::OrderId;

use crate::middleware::{ApiJson, RequireAdmin, RequireUser};
use crate::models::{Order, ShippingInfo};
use crate::services::OrderService;
use crate::state::AppState;

use super::{ApiResult, ok, ok_with};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/place", post(place))
        .route("/userorders", get(user_orders))
        .route("/status", post(update_status))
        .route("/list", get(list))
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(alias = "address")]
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub payment_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(alias = "orderId")]
    pub order_id: OrderId,
    pub status: String,
}

async fn place(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<PlaceOrderRequest>,
) -> ApiResult<Order> {
    let order = OrderService::new(&state)
        .checkout(user.id, body.shipping, body.payment_ref.as_deref())
        .await?;
    ok_with(order, "Order placed")
}

async fn user_orders(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> ApiResult<Vec<Order>> {
    ok(OrderService::new(&state).history(user.id).await?)
}

async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Order> {
    let order = OrderService::new(&state)
        .update_status(body.order_id, &body.status)
        .await?;
    ok_with(order, "Status updated")
}

async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> ApiResult<Vec<Order>> {
    ok(OrderService::new(&state).list_orders().await?)
}
