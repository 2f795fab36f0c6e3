//! Persisted store for users, products, carts and orders.
//!
//! Services never talk to a database directly; they go through the
//! [`Store`] trait object held in [`AppState`](crate::state::AppState).
//!
//! # Back ends
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx (production)
//! - [`MemoryStore`] - mutex-guarded maps (tests, local demos)
//!
//! # Tables (`PostgreSQL`)
//!
//! - `app_user` - Accounts with argon2 password hashes and roles
//! - `password_reset_code` - Pending reset codes (hashed)
//! - `product` - Catalog, including `stock`
//! - `product_review` - Reviews, ordered by insertion
//! - `cart_line` - `(user, product, size) -> quantity`
//! - `customer_order` - Order snapshots (items and shipping as JSONB)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p lakshmi-cli -- migrate
//! ```

mod memory;
mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use lakshmi_core::{Email, OrderId, OrderStatus, ProductId, UserId};

use crate::models::{
    CartLine, NewOrder, NewProduct, NewReview, NewUser, Order, Product, ProductFilter,
    ProductSummary, Review, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, new: NewUser<'_>) -> StoreResult<User>;

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>>;

    /// The user and their password hash, for login.
    async fn credentials_by_email(&self, email: &Email) -> StoreResult<Option<(User, String)>>;

    /// Replace a password hash. Fails with `NotFound` for an unknown user.
    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> StoreResult<()>;

    /// Change a display name. Fails with `NotFound` for an unknown user.
    async fn set_name(&self, id: UserId, name: &str) -> StoreResult<User>;

    /// Store (replacing any previous) the hashed reset code for a user.
    async fn put_reset_code(
        &self,
        id: UserId,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Remove and return the pending reset code for a user.
    async fn take_reset_code(&self, id: UserId) -> StoreResult<Option<(String, DateTime<Utc>)>>;

    async fn count_customers(&self) -> StoreResult<u64>;
}

/// Product catalog persistence, including stock accounting.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductSummary>>;

    /// Full product with reviews.
    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Same-category products other than `exclude`, newest first.
    async fn related_products(
        &self,
        category: &str,
        exclude: ProductId,
        limit: usize,
    ) -> StoreResult<Vec<ProductSummary>>;

    /// Append a review. Fails with `NotFound` for an unknown product.
    async fn append_review(&self, id: ProductId, review: NewReview) -> StoreResult<Review>;

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product>;

    /// Overwrite the stock count. Fails with `NotFound` for an unknown product.
    async fn set_stock(&self, id: ProductId, stock: u32) -> StoreResult<()>;

    /// Atomically apply `stock -= quantity` if and only if `stock >= quantity`.
    ///
    /// Returns `false` (and changes nothing) when stock is insufficient or
    /// the product does not exist.
    async fn decrement_stock_if_sufficient(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> StoreResult<bool>;

    /// `stock += quantity`; used to compensate a failed checkout or a cancellation.
    async fn increment_stock(&self, id: ProductId, quantity: u32) -> StoreResult<()>;

    /// Products with `stock <= threshold`, lowest stock first.
    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<ProductSummary>>;

    async fn count_products(&self) -> StoreResult<u64>;
}

/// Per-user cart persistence.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_lines(&self, user: UserId) -> StoreResult<Vec<CartLine>>;

    async fn cart_quantity(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
    ) -> StoreResult<Option<u32>>;

    /// Insert or overwrite a line. `quantity` is always ≥ 1.
    async fn put_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
        quantity: u32,
    ) -> StoreResult<()>;

    /// Delete a line; returns whether it existed.
    async fn delete_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
    ) -> StoreResult<bool>;

    /// Atomically remove and return every line in a user's cart.
    async fn take_cart(&self, user: UserId) -> StoreResult<Vec<CartLine>>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, new: NewOrder) -> StoreResult<Order>;

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// A user's orders, newest first.
    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>>;

    /// Every order, newest first.
    async fn all_orders(&self) -> StoreResult<Vec<Order>>;

    /// Set `status = to` only if it is currently `from`.
    ///
    /// Returns the updated order, or `None` if the order changed underneath.
    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<Option<Order>>;
}

/// The complete store used by the API.
#[async_trait]
pub trait Store: UserStore + CatalogStore + CartStore + OrderStore {
    /// Check connectivity (readiness probe).
    async fn ping(&self) -> StoreResult<()>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
pub(crate) fn conflict_or_database(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(format!("{what} already exists"));
    }
    StoreError::Database(e)
}
