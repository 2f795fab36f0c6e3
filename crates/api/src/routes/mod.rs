//! HTTP route handlers.
//!
//! Every handler answers with the `{success, message?, data?}` envelope.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - "API Working"
//! GET  /health, /health/ready             - Liveness / store readiness
//!
//! # Users
//! POST /api/user/register                 - Register, returns {token, user}
//! POST /api/user/login                    - Login, returns {token, user}
//! POST /api/user/forgot-password/request  - Mail a reset code
//! POST /api/user/forgot-password          - Set a new password
//! GET  /api/user/profile                  - Current user (auth)
//! PUT  /api/user/profile                  - Change display name (auth)
//!
//! # Products
//! GET  /api/product/list                  - Listing (query filters)
//! GET  /api/product/{id}                  - Detail with reviews
//! GET  /api/product/{id}/related          - Same-category products
//! POST /api/product/{id}/review/add       - Add review (auth)
//!
//! # Cart (auth)
//! POST /api/cart/add | /update | /remove
//! GET  /api/cart/get
//!
//! # Orders
//! POST /api/order/place                   - Checkout (auth)
//! GET  /api/order/userorders              - Order history (auth)
//! POST /api/order/status                  - Change status (admin)
//! GET  /api/order/list                    - All orders (admin)
//!
//! # Analytics (admin)
//! GET  /api/analytics/summary | /revenue | /top-products | /low-stock
//!
//! # Catalog management (admin)
//! POST /api/admin/product/add
//! POST /api/admin/product/stock
//! ```

pub mod admin;
pub mod analytics;
pub mod cart;
pub mod order;
pub mod product;
pub mod user;

use axum::{Json, Router};

use lakshmi_core::Envelope;

use crate::error::Result;
use crate::state::AppState;

/// Handler result: an envelope on success, `AppError` otherwise.
pub type ApiResult<T> = Result<Json<Envelope<T>>>;

/// Success envelope carrying `data`.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::ok(data)))
}

/// Success envelope carrying `data` and a message.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn ok_with<T>(data: T, message: &str) -> ApiResult<T> {
    Ok(Json(Envelope::ok_with_message(data, message)))
}

/// Success envelope with only a message.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn done(message: &str) -> ApiResult<()> {
    Ok(Json(Envelope::message(message)))
}

/// Create the `/api` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/user", user::routes())
        .nest("/api/product", product::routes())
        .nest("/api/cart", cart::routes())
        .nest("/api/order", order::routes())
        .nest("/api/analytics", analytics::routes())
        .nest("/api/admin", admin::routes())
}
