//! Catalog service: listing, product detail, reviews and admin stock management.

use tracing::instrument;

use lakshmi_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::{NewProduct, NewReview, Product, ProductFilter, ProductSummary, Review, User};
use crate::state::AppState;
use crate::store::{CatalogStore, Store, StoreError};

/// Number of related products shown under a product.
pub const RELATED_LIMIT: usize = 5;

/// Longest accepted review body, in characters.
pub const MAX_REVIEW_LENGTH: usize = 2000;

fn product_not_found() -> AppError {
    AppError::not_found("Product not found")
}

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            store: state.store(),
        }
    }

    /// Products matching `filter`, without review bodies.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductSummary>> {
        Ok(self.store.list_products(filter).await?)
    }

    /// Full product including reviews in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .product(id)
            .await?
            .ok_or_else(product_not_found)
    }

    /// Up to [`RELATED_LIMIT`] products from `category`, excluding `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn list_related(
        &self,
        category: &str,
        exclude: ProductId,
    ) -> Result<Vec<ProductSummary>> {
        Ok(self
            .store
            .related_products(category, exclude, RELATED_LIMIT)
            .await?)
    }

    /// Related products for the product with `id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn related_to(&self, id: ProductId) -> Result<Vec<ProductSummary>> {
        let product = self.get_product(id).await?;
        self.list_related(&product.category, product.id).await
    }

    /// Append a review written by `user`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for empty or overlong text.
    /// Returns `AppError::NotFound` for an unknown product.
    #[instrument(skip(self, user, text), fields(user_id = %user.id))]
    pub async fn add_review(&self, id: ProductId, user: &User, text: &str) -> Result<Review> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Review cannot be empty"));
        }
        if text.chars().count() > MAX_REVIEW_LENGTH {
            return Err(AppError::validation(format!(
                "Review must be at most {MAX_REVIEW_LENGTH} characters"
            )));
        }

        let review = NewReview {
            username: user.name.clone(),
            text: text.to_owned(),
        };
        self.store
            .append_review(id, review)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => product_not_found(),
                other => other.into(),
            })
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the name, category or sizes are missing.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: NewProduct) -> Result<Product> {
        let input = input.normalized().map_err(AppError::Validation)?;
        let product = self.store.create_product(input).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Overwrite a product's stock count.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a negative or out-of-range count.
    /// Returns `AppError::NotFound` for an unknown product.
    #[instrument(skip(self))]
    pub async fn set_stock(&self, id: ProductId, stock: i64) -> Result<()> {
        if stock < 0 {
            return Err(AppError::validation("Stock cannot be negative"));
        }
        let stock =
            u32::try_from(stock).map_err(|_| AppError::validation("Stock is too large"))?;

        self.store
            .set_stock(id, stock)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => product_not_found(),
                other => other.into(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use lakshmi_core::{Email, Price, Role};

    use super::*;
    use crate::models::NewUser;
    use crate::services::testing::state_with;
    use crate::store::{MemoryStore, UserStore};

    fn spice(name: &str, category: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: String::new(),
            price: Price::from_units(4),
            category: category.to_owned(),
            sub_category: String::new(),
            images: vec![],
            sizes: vec!["100g".to_owned()],
            stock: 10,
            bestseller: false,
        }
    }

    async fn reviewer(store: &MemoryStore) -> User {
        let email = Email::parse("meera@example.com").unwrap();
        store
            .create_user(NewUser {
                name: "Meera",
                email: &email,
                password_hash: "h",
                role: Role::Customer,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_review_is_trimmed_and_validated() {
        let store = Arc::new(MemoryStore::new());
        let user = reviewer(&store).await;
        let state = state_with(store);
        let catalog = CatalogService::new(&state);
        let product = catalog.create_product(spice("Cumin", "Spices")).await.unwrap();

        let empty = catalog.add_review(product.id, &user, "   ").await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let long = "x".repeat(MAX_REVIEW_LENGTH + 1);
        let overlong = catalog.add_review(product.id, &user, &long).await;
        assert!(matches!(overlong, Err(AppError::Validation(_))));

        let review = catalog
            .add_review(product.id, &user, "  Fresh and fragrant ")
            .await
            .unwrap();
        assert_eq!(review.text, "Fresh and fragrant");
        assert_eq!(review.username, "Meera");

        let reloaded = catalog.get_product(product.id).await.unwrap();
        assert_eq!(reloaded.reviews.len(), 1);
    }

    #[tokio::test]
    async fn test_review_unknown_product() {
        let store = Arc::new(MemoryStore::new());
        let user = reviewer(&store).await;
        let state = state_with(store);

        let result = CatalogService::new(&state)
            .add_review(ProductId::new(404), &user, "Nice")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_related_excludes_self_and_caps() {
        let state = state_with(Arc::new(MemoryStore::new()));
        let catalog = CatalogService::new(&state);

        let anchor = catalog.create_product(spice("Cumin", "Spices")).await.unwrap();
        for i in 0..7 {
            catalog
                .create_product(spice(&format!("Spice {i}"), "Spices"))
                .await
                .unwrap();
        }
        catalog.create_product(spice("Basmati", "Rice")).await.unwrap();

        let related = catalog.related_to(anchor.id).await.unwrap();
        assert_eq!(related.len(), RELATED_LIMIT);
        assert!(related.iter().all(|p| p.id != anchor.id));
        assert!(related.iter().all(|p| p.category == "Spices"));
    }

    #[tokio::test]
    async fn test_related_matches_category_case_insensitively() {
        let state = state_with(Arc::new(MemoryStore::new()));
        let catalog = CatalogService::new(&state);

        let anchor = catalog.create_product(spice("Cumin", "Spices")).await.unwrap();
        catalog.create_product(spice("Clove", "spices")).await.unwrap();
        catalog.create_product(spice("Basmati", "Rice")).await.unwrap();

        let related = catalog.related_to(anchor.id).await.unwrap();
        let names: Vec<&str> = related.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Clove"]);

        let listed = catalog
            .list_products(&ProductFilter {
                category: Some("SPICES".to_owned()),
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_set_stock_rejects_negative() {
        let state = state_with(Arc::new(MemoryStore::new()));
        let catalog = CatalogService::new(&state);
        let product = catalog.create_product(spice("Cumin", "Spices")).await.unwrap();

        let negative = catalog.set_stock(product.id, -1).await;
        assert!(matches!(negative, Err(AppError::Validation(_))));

        catalog.set_stock(product.id, 3).await.unwrap();
        assert_eq!(catalog.get_product(product.id).await.unwrap().stock, 3);

        let missing = catalog.set_stock(ProductId::new(999), 1).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
