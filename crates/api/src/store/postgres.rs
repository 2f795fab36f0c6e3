//! `PostgreSQL` store.
//!
//! Queries are built at runtime (`query_as`) so the crate compiles without a
//! live database; rows are decoded into private row structs and converted
//! with `TryFrom`, surfacing bad data as `DataCorruption`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use lakshmi_core::{Email, OrderId, OrderStatus, Price, ProductId, Role, UserId};

use super::{
    CartStore, CatalogStore, OrderStore, Store, StoreError, StoreResult, UserStore,
    conflict_or_database,
};
use crate::models::{
    CartLine, NewOrder, NewProduct, NewReview, NewUser, Order, OrderItem, Product, ProductFilter,
    ProductSort, ProductSummary, Review, ShippingInfo, User,
};

// =============================================================================
// Internal Row Types
// =============================================================================

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email)
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.category, \
     p.sub_category, p.images, p.sizes, p.stock, p.bestseller, p.created_at, \
     (SELECT COUNT(*) FROM product_review r WHERE r.product_id = p.id) AS review_count";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    sub_category: String,
    images: Vec<String>,
    sizes: Vec<String>,
    stock: i32,
    bestseller: bool,
    created_at: DateTime<Utc>,
    review_count: i64,
}

impl TryFrom<ProductRow> for ProductSummary {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: decode_price(row.price)?,
            category: row.category,
            sub_category: row.sub_category,
            images: row.images,
            sizes: row.sizes,
            stock: decode_count(row.stock)?,
            bestseller: row.bestseller,
            review_count: u32::try_from(row.review_count).unwrap_or(u32::MAX),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    username: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            username: row.username,
            text: row.body,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    product_id: i64,
    size: String,
    quantity: i32,
}

impl TryFrom<CartRow> for CartLine {
    type Error = StoreError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            size: row.size,
            quantity: decode_count(row.quantity)?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, items, subtotal, delivery_fee, total, shipping, \
     payment_ref, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    items: Json<Vec<OrderItem>>,
    subtotal: Decimal,
    delivery_fee: Decimal,
    total: Decimal,
    shipping: Json<ShippingInfo>,
    payment_ref: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: row.items.0,
            subtotal: decode_price(row.subtotal)?,
            delivery_fee: decode_price(row.delivery_fee)?,
            total: decode_price(row.total)?,
            shipping: row.shipping.0,
            payment_ref: row.payment_ref,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_price(amount: Decimal) -> StoreResult<Price> {
    Price::new(amount).map_err(|e| StoreError::DataCorruption(format!("invalid price: {e}")))
}

fn decode_count(value: i32) -> StoreResult<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::DataCorruption(format!("negative count in database: {value}")))
}

fn encode_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn encode_limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn count_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (used by the CLI for migrations).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new: NewUser<'_>) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO app_user (name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(new.name)
        .bind(new.email.as_str())
        .bind(new.password_hash)
        .bind(new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "email"))?;

        row.try_into()
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn credentials_by_email(&self, email: &Email) -> StoreResult<Option<(User, String)>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM app_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Ok((r.user.try_into()?, r.password_hash)))
            .transpose()
    }

    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE app_user SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_name(&self, id: UserId, name: &str) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE app_user SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        row.try_into()
    }

    async fn put_reset_code(
        &self,
        id: UserId,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO password_reset_code (user_id, code_hash, expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE \
             SET code_hash = EXCLUDED.code_hash, expires_at = EXCLUDED.expires_at",
        )
        .bind(id)
        .bind(code_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_reset_code(&self, id: UserId) -> StoreResult<Option<(String, DateTime<Utc>)>> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            "DELETE FROM password_reset_code WHERE user_id = $1 RETURNING code_hash, expires_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn count_customers(&self) -> StoreResult<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM app_user WHERE role = 'customer'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count_to_u64(count))
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductSummary>> {
        let order_by = match filter.sort {
            ProductSort::Newest => "p.created_at DESC, p.id DESC",
            ProductSort::PriceAsc => "p.price ASC, p.id ASC",
            ProductSort::PriceDesc => "p.price DESC, p.id ASC",
        };
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM product p \
             WHERE ($1::TEXT IS NULL OR LOWER(p.category) = LOWER($1)) \
               AND ($2::TEXT IS NULL OR LOWER(p.sub_category) = LOWER($2)) \
               AND ($3::TEXT IS NULL OR STRPOS(LOWER(p.name), $3) > 0) \
               AND ($4::BOOLEAN IS NULL OR p.bestseller = $4) \
             ORDER BY {order_by}"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.category.as_deref())
            .bind(filter.sub_category.as_deref())
            .bind(search)
            .bind(filter.bestseller)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let summary = ProductSummary::try_from(row)?;

        let reviews = sqlx::query_as::<_, ReviewRow>(
            "SELECT username, body, created_at FROM product_review \
             WHERE product_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Product {
            id: summary.id,
            name: summary.name,
            description: summary.description,
            price: summary.price,
            category: summary.category,
            sub_category: summary.sub_category,
            images: summary.images,
            sizes: summary.sizes,
            stock: summary.stock,
            bestseller: summary.bestseller,
            reviews: reviews.into_iter().map(Review::from).collect(),
            created_at: summary.created_at,
        }))
    }

    async fn related_products(
        &self,
        category: &str,
        exclude: ProductId,
        limit: usize,
    ) -> StoreResult<Vec<ProductSummary>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM product p \
             WHERE LOWER(p.category) = LOWER($1) AND p.id <> $2 \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .bind(exclude)
            .bind(encode_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn append_review(&self, id: ProductId, review: NewReview) -> StoreResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO product_review (product_id, username, body) \
             SELECT id, $2, $3 FROM product WHERE id = $1 \
             RETURNING username, body, created_at",
        )
        .bind(id)
        .bind(&review.username)
        .bind(&review.text)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(row.into())
    }

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let id: (i64,) = sqlx::query_as(
            "INSERT INTO product \
             (name, description, price, category, sub_category, images, sizes, stock, bestseller) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.amount())
        .bind(&new.category)
        .bind(&new.sub_category)
        .bind(&new.images)
        .bind(&new.sizes)
        .bind(encode_count(new.stock))
        .bind(new.bestseller)
        .fetch_one(&self.pool)
        .await?;

        self.product(ProductId::new(id.0))
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> StoreResult<()> {
        let result = sqlx::query("UPDATE product SET stock = $2 WHERE id = $1")
            .bind(id)
            .bind(encode_count(stock))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn decrement_stock_if_sufficient(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> StoreResult<bool> {
        // Single conditional UPDATE: the row lock serialises concurrent checkouts.
        let result =
            sqlx::query("UPDATE product SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                .bind(id)
                .bind(encode_count(quantity))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_stock(&self, id: ProductId, quantity: u32) -> StoreResult<()> {
        let result = sqlx::query("UPDATE product SET stock = stock + $2 WHERE id = $1")
            .bind(id)
            .bind(encode_count(quantity))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<ProductSummary>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM product p WHERE p.stock <= $1 \
             ORDER BY p.stock ASC, p.id ASC"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(encode_count(threshold))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_products(&self) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product")
            .fetch_one(&self.pool)
            .await?;
        Ok(count_to_u64(count))
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart_lines(&self, user: UserId) -> StoreResult<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT product_id, size, quantity FROM cart_line \
             WHERE user_id = $1 ORDER BY product_id, size",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn cart_quantity(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
    ) -> StoreResult<Option<u32>> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT quantity FROM cart_line WHERE user_id = $1 AND product_id = $2 AND size = $3",
        )
        .bind(user)
        .bind(product)
        .bind(size)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(q,)| decode_count(q)).transpose()
    }

    async fn put_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
        quantity: u32,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO cart_line (user_id, product_id, size, quantity) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, product_id, size) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(user)
        .bind(product)
        .bind(size)
        .bind(encode_count(quantity))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM cart_line WHERE user_id = $1 AND product_id = $2 AND size = $3",
        )
        .bind(user)
        .bind(product)
        .bind(size)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn take_cart(&self, user: UserId) -> StoreResult<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartRow>(
            "DELETE FROM cart_line WHERE user_id = $1 RETURNING product_id, size, quantity",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        let mut lines = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<StoreResult<Vec<CartLine>>>()?;
        lines.sort_by(|a, b| a.product_id.cmp(&b.product_id).then(a.size.cmp(&b.size)));
        Ok(lines)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, new: NewOrder) -> StoreResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO customer_order \
             (user_id, items, subtotal, delivery_fee, total, shipping, payment_ref) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(Json(&new.items))
        .bind(new.subtotal.amount())
        .bind(new.delivery_fee.amount())
        .bind(new.total.amount())
        .bind(Json(&new.shipping))
        .bind(&new.payment_ref)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn all_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE customer_order SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
