//! In-process store backed by mutex-guarded maps.
//!
//! Every operation takes the single lock for its whole duration, so the
//! conditional stock decrement is atomic with respect to other callers.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use lakshmi_core::{Email, OrderId, OrderStatus, ProductId, UserId};

use super::{CartStore, CatalogStore, OrderStore, Store, StoreError, StoreResult, UserStore};
use crate::models::{
    CartLine, NewOrder, NewProduct, NewReview, NewUser, Order, Product, ProductFilter,
    ProductSummary, Review, User,
};

#[derive(Default)]
struct Tables {
    next_user: i64,
    next_product: i64,
    next_order: i64,
    users: BTreeMap<UserId, (User, String)>,
    reset_codes: HashMap<UserId, (String, DateTime<Utc>)>,
    products: BTreeMap<ProductId, Product>,
    /// Keyed by user; lines keep insertion order.
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: BTreeMap<OrderId, Order>,
}

impl Tables {
    fn product_mut(&mut self, id: ProductId) -> StoreResult<&mut Product> {
        self.products.get_mut(&id).ok_or(StoreError::NotFound)
    }
}

/// Store used by tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(orders: impl Iterator<Item = Order>) -> Vec<Order> {
    let mut orders: Vec<Order> = orders.collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    orders
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new: NewUser<'_>) -> StoreResult<User> {
        let mut t = self.tables.lock();
        if t.users.values().any(|(u, _)| &u.email == new.email) {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }
        t.next_user += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(t.next_user),
            name: new.name.to_owned(),
            email: new.email.clone(),
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        t.users
            .insert(user.id, (user.clone(), new.password_hash.to_owned()));
        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn credentials_by_email(&self, email: &Email) -> StoreResult<Option<(User, String)>> {
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let mut t = self.tables.lock();
        let (user, hash) = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        password_hash.clone_into(hash);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_name(&self, id: UserId, name: &str) -> StoreResult<User> {
        let mut t = self.tables.lock();
        let (user, _) = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        name.clone_into(&mut user.name);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn put_reset_code(
        &self,
        id: UserId,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.tables
            .lock()
            .reset_codes
            .insert(id, (code_hash.to_owned(), expires_at));
        Ok(())
    }

    async fn take_reset_code(&self, id: UserId) -> StoreResult<Option<(String, DateTime<Utc>)>> {
        Ok(self.tables.lock().reset_codes.remove(&id))
    }

    async fn count_customers(&self) -> StoreResult<u64> {
        let t = self.tables.lock();
        Ok(t.users.values().filter(|(u, _)| !u.is_admin()).count() as u64)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductSummary>> {
        let mut items: Vec<ProductSummary> = self
            .tables
            .lock()
            .products
            .values()
            .map(ProductSummary::from)
            .filter(|p| filter.matches(p))
            .collect();
        filter.sort(&mut items);
        Ok(items)
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.tables.lock().products.get(&id).cloned())
    }

    async fn related_products(
        &self,
        category: &str,
        exclude: ProductId,
        limit: usize,
    ) -> StoreResult<Vec<ProductSummary>> {
        let mut items: Vec<ProductSummary> = self
            .tables
            .lock()
            .products
            .values()
            .filter(|p| p.id != exclude && p.category.eq_ignore_ascii_case(category))
            .map(ProductSummary::from)
            .collect();
        ProductFilter::default().sort(&mut items);
        items.truncate(limit);
        Ok(items)
    }

    async fn append_review(&self, id: ProductId, review: NewReview) -> StoreResult<Review> {
        let mut t = self.tables.lock();
        let product = t.product_mut(id)?;
        let review = Review {
            username: review.username,
            text: review.text,
            created_at: Utc::now(),
        };
        product.reviews.push(review.clone());
        Ok(review)
    }

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let mut t = self.tables.lock();
        t.next_product += 1;
        let product = Product {
            id: ProductId::new(t.next_product),
            name: new.name,
            description: new.description,
            price: new.price,
            category: new.category,
            sub_category: new.sub_category,
            images: new.images,
            sizes: new.sizes,
            stock: new.stock,
            bestseller: new.bestseller,
            reviews: Vec::new(),
            created_at: Utc::now(),
        };
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> StoreResult<()> {
        self.tables.lock().product_mut(id)?.stock = stock;
        Ok(())
    }

    async fn decrement_stock_if_sufficient(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> StoreResult<bool> {
        let mut t = self.tables.lock();
        let Some(product) = t.products.get_mut(&id) else {
            return Ok(false);
        };
        if product.stock < quantity {
            return Ok(false);
        }
        product.stock -= quantity;
        Ok(true)
    }

    async fn increment_stock(&self, id: ProductId, quantity: u32) -> StoreResult<()> {
        let mut t = self.tables.lock();
        let product = t.product_mut(id)?;
        product.stock = product.stock.saturating_add(quantity);
        Ok(())
    }

    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<ProductSummary>> {
        let mut items: Vec<ProductSummary> = self
            .tables
            .lock()
            .products
            .values()
            .filter(|p| p.stock <= threshold)
            .map(ProductSummary::from)
            .collect();
        items.sort_by(|a, b| a.stock.cmp(&b.stock).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn count_products(&self) -> StoreResult<u64> {
        Ok(self.tables.lock().products.len() as u64)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_lines(&self, user: UserId) -> StoreResult<Vec<CartLine>> {
        Ok(self
            .tables
            .lock()
            .carts
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn cart_quantity(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
    ) -> StoreResult<Option<u32>> {
        Ok(self.tables.lock().carts.get(&user).and_then(|lines| {
            lines
                .iter()
                .find(|l| l.product_id == product && l.size == size)
                .map(|l| l.quantity)
        }))
    }

    async fn put_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
        quantity: u32,
    ) -> StoreResult<()> {
        let mut t = self.tables.lock();
        let lines = t.carts.entry(user).or_default();
        match lines
            .iter_mut()
            .find(|l| l.product_id == product && l.size == size)
        {
            Some(line) => line.quantity = quantity,
            None => lines.push(CartLine {
                product_id: product,
                size: size.to_owned(),
                quantity,
            }),
        }
        Ok(())
    }

    async fn delete_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
    ) -> StoreResult<bool> {
        let mut t = self.tables.lock();
        let Some(lines) = t.carts.get_mut(&user) else {
            return Ok(false);
        };
        let before = lines.len();
        lines.retain(|l| !(l.product_id == product && l.size == size));
        Ok(lines.len() != before)
    }

    async fn take_cart(&self, user: UserId) -> StoreResult<Vec<CartLine>> {
        Ok(self.tables.lock().carts.remove(&user).unwrap_or_default())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, new: NewOrder) -> StoreResult<Order> {
        let mut t = self.tables.lock();
        t.next_order += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(t.next_order),
            user_id: new.user_id,
            items: new.items,
            subtotal: new.subtotal,
            delivery_fee: new.delivery_fee,
            total: new.total,
            shipping: new.shipping,
            payment_ref: new.payment_ref,
            status: OrderStatus::Placed,
            created_at: now,
            updated_at: now,
        };
        t.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        let t = self.tables.lock();
        Ok(newest_first(
            t.orders.values().filter(|o| o.user_id == user).cloned(),
        ))
    }

    async fn all_orders(&self) -> StoreResult<Vec<Order>> {
        let t = self.tables.lock();
        Ok(newest_first(t.orders.values().cloned()))
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let mut t = self.tables.lock();
        let Some(order) = t.orders.get_mut(&id) else {
            return Ok(None);
        };
        if order.status != from {
            return Ok(None);
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use lakshmi_core::Price;

    use super::*;

    fn new_product(stock: u32) -> NewProduct {
        NewProduct {
            name: "Turmeric".to_owned(),
            description: String::new(),
            price: Price::from_units(5),
            category: "Spices".to_owned(),
            sub_category: String::new(),
            images: vec![],
            sizes: vec!["100g".to_owned()],
            stock,
            bestseller: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let email = Email::parse("a@example.com").unwrap();
        let new = NewUser {
            name: "A",
            email: &email,
            password_hash: "h",
            role: lakshmi_core::Role::Customer,
        };
        store.create_user(new.clone()).await.unwrap();
        assert!(matches!(
            store.create_user(new).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_decrement_refuses_insufficient_stock() {
        let store = MemoryStore::new();
        let p = store.create_product(new_product(2)).await.unwrap();

        assert!(!store.decrement_stock_if_sufficient(p.id, 3).await.unwrap());
        assert!(store.decrement_stock_if_sufficient(p.id, 2).await.unwrap());
        assert!(!store.decrement_stock_if_sufficient(p.id, 1).await.unwrap());
        assert_eq!(store.product(p.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_concurrent_decrements_never_oversell() {
        let store = Arc::new(MemoryStore::new());
        let p = store.create_product(new_product(5)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.decrement_stock_if_sufficient(p.id, 1).await.unwrap()
            }));
        }
        let mut won = 0;
        for h in handles {
            if h.await.unwrap() {
                won += 1;
            }
        }
        assert_eq!(won, 5);
        assert_eq!(store.product(p.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_cart_line_upsert_and_delete() {
        let store = MemoryStore::new();
        let user = UserId::new(1);
        let product = ProductId::new(1);

        store.put_cart_line(user, product, "S", 1).await.unwrap();
        store.put_cart_line(user, product, "S", 3).await.unwrap();
        store.put_cart_line(user, product, "M", 1).await.unwrap();
        assert_eq!(store.cart_lines(user).await.unwrap().len(), 2);
        assert_eq!(
            store.cart_quantity(user, product, "S").await.unwrap(),
            Some(3)
        );

        assert!(store.delete_cart_line(user, product, "S").await.unwrap());
        assert!(!store.delete_cart_line(user, product, "S").await.unwrap());
    }

    #[tokio::test]
    async fn test_status_update_is_compare_and_set() {
        let store = MemoryStore::new();
        let order = store
            .insert_order(NewOrder {
                user_id: UserId::new(1),
                items: vec![],
                subtotal: Price::ZERO,
                delivery_fee: Price::ZERO,
                total: Price::ZERO,
                shipping: crate::models::ShippingInfo {
                    first_name: "A".to_owned(),
                    last_name: "B".to_owned(),
                    email: "a@example.com".to_owned(),
                    phone: "1".to_owned(),
                    street: "s".to_owned(),
                    city: "c".to_owned(),
                    state: String::new(),
                    zip_code: "z".to_owned(),
                    country: "IN".to_owned(),
                },
                payment_ref: "cod".to_owned(),
            })
            .await
            .unwrap();

        let stale = store
            .update_order_status(order.id, OrderStatus::Shipped, OrderStatus::Delivered)
            .await
            .unwrap();
        assert!(stale.is_none());

        let updated = store
            .update_order_status(order.id, OrderStatus::Placed, OrderStatus::Processing)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);
    }
}
