//! Cart service.
//!
//! Quantities arrive as signed integers so negative input is a validation
//! failure rather than a decode failure.

use tracing::instrument;

use lakshmi_core::{ProductId, UserId};

use crate::error::{AppError, Result};
use crate::models::{CartLineView, CartView, Product};
use crate::state::AppState;
use crate::store::{CartStore, CatalogStore, Store};

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            store: state.store(),
        }
    }

    async fn product_with_size(&self, product_id: ProductId, size: &str) -> Result<Product> {
        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        if !product.has_size(size) {
            return Err(AppError::validation("Please select a valid size"));
        }
        Ok(product)
    }

    /// Add `quantity` of a product in `size`, merging with an existing line.
    ///
    /// The merged quantity is clamped to stock.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a quantity below 1 or an unknown size.
    /// Returns `AppError::NotFound` for an unknown product.
    /// Returns `AppError::OutOfStock` if `quantity` alone exceeds stock; nothing is written.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user: UserId,
        product_id: ProductId,
        size: &str,
        quantity: i64,
    ) -> Result<CartView> {
        if quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }
        let size = size.trim();
        let product = self.product_with_size(product_id, size).await?;

        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        if requested > product.stock {
            return Err(out_of_stock(&product));
        }

        let existing = self
            .store
            .cart_quantity(user, product_id, size)
            .await?
            .unwrap_or(0);
        let merged = existing.saturating_add(requested).min(product.stock);

        self.store
            .put_cart_line(user, product_id, size, merged)
            .await?;
        self.get_cart(user).await
    }

    /// Set a line's quantity; `0` removes it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a negative quantity or an unknown size.
    /// Returns `AppError::NotFound` for an unknown product.
    /// Returns `AppError::OutOfStock` if `quantity` exceeds stock.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user: UserId,
        product_id: ProductId,
        size: &str,
        quantity: i64,
    ) -> Result<CartView> {
        if quantity < 0 {
            return Err(AppError::validation("Quantity cannot be negative"));
        }
        let size = size.trim();
        if quantity == 0 {
            return self.remove_item(user, product_id, size).await;
        }

        let product = self.product_with_size(product_id, size).await?;
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if quantity > product.stock {
            return Err(out_of_stock(&product));
        }

        self.store
            .put_cart_line(user, product_id, size, quantity)
            .await?;
        self.get_cart(user).await
    }

    /// Remove a line. Removing a line that is not there succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user: UserId,
        product_id: ProductId,
        size: &str,
    ) -> Result<CartView> {
        self.store
            .delete_cart_line(user, product_id, size.trim())
            .await?;
        self.get_cart(user).await
    }

    /// The user's cart resolved against live products.
    ///
    /// Lines whose product no longer exists are left out.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn get_cart(&self, user: UserId) -> Result<CartView> {
        let lines = self.store.cart_lines(user).await?;

        let mut views = Vec::with_capacity(lines.len());
        for line in lines {
            let Some(product) = self.store.product(line.product_id).await? else {
                tracing::debug!(product_id = %line.product_id, "Skipping cart line for missing product");
                continue;
            };
            views.push(CartLineView {
                product_id: product.id,
                name: product.name.clone(),
                size: line.size,
                quantity: line.quantity,
                unit_price: product.price,
                line_total: product.price.times(line.quantity),
                image: product.primary_image().map(str::to_owned),
                stock: product.stock,
            });
        }
        Ok(CartView::from_lines(views))
    }
}

fn out_of_stock(product: &Product) -> AppError {
    AppError::OutOfStock {
        product: product.name.clone(),
        available: product.stock,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use lakshmi_core::Price;

    use super::*;
    use crate::models::NewProduct;
    use crate::services::testing::state_with;
    use crate::store::MemoryStore;

    async fn seeded(stock: u32) -> (AppState, ProductId) {
        let store = Arc::new(MemoryStore::new());
        let product = store
            .create_product(NewProduct {
                name: "Ghee".to_owned(),
                description: String::new(),
                price: Price::from_units(12),
                category: "Dairy".to_owned(),
                sub_category: String::new(),
                images: vec!["ghee.jpg".to_owned()],
                sizes: vec!["500ml".to_owned(), "1l".to_owned()],
                stock,
                bestseller: false,
            })
            .await
            .unwrap();
        (state_with(store), product.id)
    }

    #[tokio::test]
    async fn test_add_more_than_stock_writes_nothing() {
        let (state, product) = seeded(3).await;
        let cart = CartService::new(&state);
        let user = UserId::new(1);

        let err = cart.add_item(user, product, "500ml", 5).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfStock { available: 3, .. }));
        assert!(cart.get_cart(user).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_merged_add_is_clamped_to_stock() {
        let (state, product) = seeded(3).await;
        let cart = CartService::new(&state);
        let user = UserId::new(1);

        cart.add_item(user, product, "500ml", 2).await.unwrap();
        let view = cart.add_item(user, product, "500ml", 2).await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 3);
        assert_eq!(view.subtotal, Price::from_units(36));
        assert_eq!(view.lines[0].image.as_deref(), Some("ghee.jpg"));
    }

    #[tokio::test]
    async fn test_add_validates_quantity_and_size() {
        let (state, product) = seeded(3).await;
        let cart = CartService::new(&state);
        let user = UserId::new(1);

        assert!(matches!(
            cart.add_item(user, product, "500ml", 0).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            cart.add_item(user, product, "2l", 1).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            cart.add_item(user, ProductId::new(99), "500ml", 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_zero_removes_and_negative_rejected() {
        let (state, product) = seeded(3).await;
        let cart = CartService::new(&state);
        let user = UserId::new(1);

        cart.add_item(user, product, "1l", 1).await.unwrap();
        assert!(matches!(
            cart.update_item(user, product, "1l", -1).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            cart.update_item(user, product, "1l", 4).await,
            Err(AppError::OutOfStock { .. })
        ));

        let view = cart.update_item(user, product, "1l", 2).await.unwrap();
        assert_eq!(view.item_count, 2);

        let view = cart.update_item(user, product, "1l", 0).await.unwrap();
        assert!(view.lines.is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_line_is_noop() {
        let (state, product) = seeded(3).await;
        let cart = CartService::new(&state);
        let user = UserId::new(1);

        cart.add_item(user, product, "1l", 1).await.unwrap();
        let view = cart.remove_item(user, product, "500ml").await.unwrap();
        assert_eq!(view.lines.len(), 1);
    }
}
