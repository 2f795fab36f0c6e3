//! Order service: checkout, history and admin status management.

use std::str::FromStr;

use tracing::instrument;

use lakshmi_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use crate::error::{AppError, Result};
use crate::models::{CartLine, NewOrder, Order, OrderItem, ShippingInfo};
use crate::state::AppState;
use crate::store::{CartStore, CatalogStore, OrderStore, Store};

/// Payment reference recorded when the client does not send one.
pub const DEFAULT_PAYMENT_REF: &str = "COD";

fn order_not_found() -> AppError {
    AppError::not_found("Order not found")
}

/// Order service.
pub struct OrderService<'a> {
    store: &'a dyn Store,
    delivery_fee: Price,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            store: state.store(),
            delivery_fee: state.config().delivery_fee,
        }
    }

    /// Turn the user's cart into an order.
    ///
    /// The cart is claimed up front, so concurrent checkouts by the same user
    /// cannot both see it. Stock is then taken line by line with a conditional
    /// decrement. If any line cannot be satisfied, or the order cannot be
    /// stored, every decrement already applied is put back and the cart lines
    /// are restored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyCart` if there is nothing to buy.
    /// Returns `AppError::Validation` for incomplete shipping details or a size
    /// that is no longer offered.
    /// Returns `AppError::NotFound` if a product was removed.
    /// Returns `AppError::OutOfStock` if a line exceeds live stock.
    #[instrument(skip(self, shipping, payment_ref))]
    pub async fn checkout(
        &self,
        user: UserId,
        shipping: ShippingInfo,
        payment_ref: Option<&str>,
    ) -> Result<Order> {
        let shipping = shipping.normalized().map_err(AppError::Validation)?;
        let payment_ref = payment_ref
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_REF)
            .to_owned();

        let lines = self.store.take_cart(user).await?;
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let mut taken: Vec<(ProductId, u32)> = Vec::with_capacity(lines.len());
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            match self.take_line(line.product_id, &line.size, line.quantity).await {
                Ok(item) => {
                    taken.push((line.product_id, line.quantity));
                    items.push(item);
                }
                Err(e) => {
                    self.restock(&taken).await;
                    self.restore_cart(user, &lines).await;
                    return Err(e);
                }
            }
        }

        let subtotal: Price = items.iter().map(OrderItem::line_total).sum();
        let new_order = NewOrder {
            user_id: user,
            items,
            subtotal,
            delivery_fee: self.delivery_fee,
            total: subtotal + self.delivery_fee,
            shipping,
            payment_ref,
        };

        let order = match self.store.insert_order(new_order).await {
            Ok(order) => order,
            Err(e) => {
                self.restock(&taken).await;
                self.restore_cart(user, &lines).await;
                return Err(e.into());
            }
        };

        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order)
    }

    /// Validate one cart line against the live product and take its stock.
    async fn take_line(&self, product_id: ProductId, size: &str, quantity: u32) -> Result<OrderItem> {
        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        if !product.has_size(size) {
            return Err(AppError::validation(format!(
                "Size {size} is no longer available for {}",
                product.name
            )));
        }

        if !self
            .store
            .decrement_stock_if_sufficient(product_id, quantity)
            .await?
        {
            let available = self
                .store
                .product(product_id)
                .await
                .ok()
                .flatten()
                .map_or(0, |p| p.stock);
            return Err(AppError::OutOfStock {
                product: product.name,
                available,
            });
        }

        Ok(OrderItem {
            product_id,
            image: product.primary_image().map(str::to_owned),
            name: product.name,
            size: size.to_owned(),
            quantity,
            unit_price: product.price,
        })
    }

    /// Put claimed cart lines back; failures are logged, not returned.
    async fn restore_cart(&self, user: UserId, lines: &[CartLine]) {
        for line in lines {
            if let Err(e) = self
                .store
                .put_cart_line(user, line.product_id, &line.size, line.quantity)
                .await
            {
                tracing::error!(
                    user_id = %user,
                    product_id = %line.product_id,
                    error = %e,
                    "Failed to restore cart line"
                );
            }
        }
    }

    /// Put stock back; failures are logged, not returned.
    async fn restock(&self, lines: &[(ProductId, u32)]) {
        for &(product_id, quantity) in lines {
            if let Err(e) = self.store.increment_stock(product_id, quantity).await {
                tracing::error!(
                    product_id = %product_id,
                    quantity,
                    error = %e,
                    "Failed to restore stock"
                );
            }
        }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn history(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user).await?)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.store.all_orders().await?)
    }

    /// Move an order to `status`. Cancelling puts the order's stock back.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unknown status name.
    /// Returns `AppError::NotFound` for an unknown order.
    /// Returns `AppError::InvalidTransition` for a backward, same-status or
    /// post-terminal move; the order is unchanged.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order> {
        let to = OrderStatus::from_str(status)
            .map_err(|_| AppError::validation(format!("Unknown order status: {status}")))?;

        let order = self.store.order(id).await?.ok_or_else(order_not_found)?;
        let from = order.status;
        if !from.can_transition_to(to) {
            return Err(AppError::InvalidTransition { from, to });
        }

        let Some(updated) = self.store.update_order_status(id, from, to).await? else {
            // Changed underneath us; report against the status now stored.
            let current = self.store.order(id).await?.ok_or_else(order_not_found)?;
            return Err(AppError::InvalidTransition {
                from: current.status,
                to,
            });
        };

        if to == OrderStatus::Cancelled {
            let lines: Vec<(ProductId, u32)> = updated
                .items
                .iter()
                .map(|i| (i.product_id, i.quantity))
                .collect();
            self.restock(&lines).await;
        }

        tracing::info!(order_id = %id, %from, %to, "Order status updated");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::NewProduct;
    use crate::services::cart::CartService;
    use crate::services::testing::{shipping, state_with};
    use crate::store::MemoryStore;

    async fn product(store: &MemoryStore, name: &str, price: u32, stock: u32) -> ProductId {
        store
            .create_product(NewProduct {
                name: name.to_owned(),
                description: String::new(),
                price: Price::from_units(price),
                category: "Spices".to_owned(),
                sub_category: String::new(),
                images: vec![],
                sizes: vec!["100g".to_owned()],
                stock,
                bestseller: false,
            })
            .await
            .unwrap()
            .id
    }

    async fn stock_of(store: &MemoryStore, id: ProductId) -> u32 {
        store.product(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_checkout_totals_and_clears_cart() {
        let store = Arc::new(MemoryStore::new());
        let pepper = product(&store, "Pepper", 4, 10).await;
        let clove = product(&store, "Clove", 3, 10).await;
        let state = state_with(store.clone());
        let user = UserId::new(1);

        let cart = CartService::new(&state);
        cart.add_item(user, pepper, "100g", 2).await.unwrap();
        cart.add_item(user, clove, "100g", 1).await.unwrap();

        let order = OrderService::new(&state)
            .checkout(user, shipping(), None)
            .await
            .unwrap();

        assert_eq!(order.subtotal, Price::from_units(11));
        assert_eq!(order.delivery_fee, Price::from_units(10));
        assert_eq!(order.total, Price::from_units(21));
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.payment_ref, DEFAULT_PAYMENT_REF);
        assert_eq!(stock_of(&store, pepper).await, 8);
        assert!(cart.get_cart(user).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let state = state_with(Arc::new(MemoryStore::new()));
        let err = OrderService::new(&state)
            .checkout(UserId::new(1), shipping(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyCart));
    }

    #[tokio::test]
    async fn test_failed_line_restores_earlier_lines() {
        let store = Arc::new(MemoryStore::new());
        let pepper = product(&store, "Pepper", 4, 5).await;
        let clove = product(&store, "Clove", 3, 5).await;
        let user = UserId::new(1);
        store.put_cart_line(user, pepper, "100g", 2).await.unwrap();
        store.put_cart_line(user, clove, "100g", 4).await.unwrap();
        // Another shopper buys most of the cloves first.
        store.set_stock(clove, 1).await.unwrap();

        let state = state_with(store.clone());
        let err = OrderService::new(&state)
            .checkout(user, shipping(), Some("upi-123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OutOfStock { available: 1, .. }));
        assert_eq!(stock_of(&store, pepper).await, 5);
        assert_eq!(stock_of(&store, clove).await, 1);
        assert_eq!(store.cart_lines(user).await.unwrap().len(), 2);
        assert!(store.all_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_for_last_unit() {
        let store = Arc::new(MemoryStore::new());
        let pepper = product(&store, "Pepper", 4, 1).await;
        let (alice, bob) = (UserId::new(1), UserId::new(2));
        store.put_cart_line(alice, pepper, "100g", 1).await.unwrap();
        store.put_cart_line(bob, pepper, "100g", 1).await.unwrap();
        let state = state_with(store.clone());

        let run = |user| {
            let state = state.clone();
            tokio::spawn(async move {
                OrderService::new(&state)
                    .checkout(user, shipping(), None)
                    .await
            })
        };
        let (a, b) = (run(alice), run(bob));
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(AppError::OutOfStock { .. })))
        );
        assert_eq!(stock_of(&store, pepper).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_cart_is_ordered_once() {
        let store = Arc::new(MemoryStore::new());
        let pepper = product(&store, "Pepper", 4, 50).await;
        let user = UserId::new(1);
        store.put_cart_line(user, pepper, "100g", 2).await.unwrap();
        let state = state_with(store.clone());

        let run = || {
            let state = state.clone();
            tokio::spawn(async move {
                OrderService::new(&state)
                    .checkout(user, shipping(), None)
                    .await
            })
        };
        let (a, b) = (run(), run());
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(AppError::EmptyCart))));
        assert_eq!(store.all_orders().await.unwrap().len(), 1);
        assert_eq!(stock_of(&store, pepper).await, 48);
        assert!(store.cart_lines(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_transitions_and_cancel_restocks() {
        let store = Arc::new(MemoryStore::new());
        let pepper = product(&store, "Pepper", 4, 5).await;
        let user = UserId::new(1);
        store.put_cart_line(user, pepper, "100g", 2).await.unwrap();
        let state = state_with(store.clone());
        let orders = OrderService::new(&state);

        let order = orders.checkout(user, shipping(), None).await.unwrap();
        assert_eq!(stock_of(&store, pepper).await, 3);

        let shipped = orders.update_status(order.id, "shipped").await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        assert!(matches!(
            orders.update_status(order.id, "processing").await,
            Err(AppError::InvalidTransition { .. })
        ));
        assert!(matches!(
            orders.update_status(order.id, "lost").await,
            Err(AppError::Validation(_))
        ));

        let cancelled = orders.update_status(order.id, "cancelled").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&store, pepper).await, 5);

        assert!(matches!(
            orders.update_status(order.id, "delivered").await,
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_delivered_cannot_go_back() {
        let store = Arc::new(MemoryStore::new());
        let pepper = product(&store, "Pepper", 4, 5).await;
        let user = UserId::new(1);
        store.put_cart_line(user, pepper, "100g", 1).await.unwrap();
        let state = state_with(store.clone());
        let orders = OrderService::new(&state);

        let order = orders.checkout(user, shipping(), None).await.unwrap();
        orders.update_status(order.id, "delivered").await.unwrap();

        let err = orders.update_status(order.id, "placed").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Placed
            }
        ));
        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let state = state_with(Arc::new(MemoryStore::new()));
        assert!(matches!(
            OrderService::new(&state)
                .update_status(OrderId::new(9), "shipped")
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}
