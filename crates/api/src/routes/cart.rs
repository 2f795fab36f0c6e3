//! Cart route handlers. All require a signed-in user.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;

use lakshmi_core::ProductId;

use crate::middleware::{ApiJson, RequireUser};
use crate::models::CartView;
use crate::services::CartService;
use crate::state::AppState;

use super::{ApiResult, ok, ok_with};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(add))
        .route("/update", post(update))
        .route("/remove", post(remove))
        .route("/get", get(get_cart))
}

const fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    #[serde(alias = "itemId")]
    pub product_id: ProductId,
    pub size: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CartRemoveRequest {
    #[serde(alias = "itemId")]
    pub product_id: ProductId,
    pub size: String,
}

async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<CartLineRequest>,
) -> ApiResult<CartView> {
    let cart = CartService::new(&state)
        .add_item(user.id, body.product_id, &body.size, body.quantity)
        .await?;
    ok_with(cart, "Added to cart")
}

async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<CartLineRequest>,
) -> ApiResult<CartView> {
    let cart = CartService::new(&state)
        .update_item(user.id, body.product_id, &body.size, body.quantity)
        .await?;
    ok_with(cart, "Cart updated")
}

async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<CartRemoveRequest>,
) -> ApiResult<CartView> {
    let cart = CartService::new(&state)
        .remove_item(user.id, body.product_id, &body.size)
        .await?;
    ok_with(cart, "Removed from cart")
}

async fn get_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> ApiResult<CartView> {
    ok(CartService::new(&state).get_cart(user.id).await?)
}
