//! Product catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lakshmi_core::{Price, ProductId};

/// A review embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer's display name at the time of writing.
    pub username: String,
    /// Review body, trimmed.
    pub text: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// Input for appending a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub username: String,
    pub text: String,
}

/// Full product projection, including reviews in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub sub_category: String,
    /// Image URLs; the first one is the primary image.
    pub images: Vec<String>,
    /// Size/quantity labels a shopper picks from (e.g. "250g").
    pub sizes: Vec<String>,
    pub stock: u32,
    pub bestseller: bool,
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether `size` is one of this product's labels.
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }

    /// Primary image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Listing projection: everything except review bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub sub_category: String,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub stock: u32,
    pub bestseller: bool,
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            category: p.category.clone(),
            sub_category: p.sub_category.clone(),
            images: p.images.clone(),
            sizes: p.sizes.clone(),
            stock: p.stock,
            bestseller: p.bestseller,
            review_count: u32::try_from(p.reviews.len()).unwrap_or(u32::MAX),
            created_at: p.created_at,
        }
    }
}

/// Input for creating a product (admin).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub bestseller: bool,
}

impl NewProduct {
    /// Trim text fields and check required ones.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message naming the first invalid field.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.name = self.name.trim().to_owned();
        self.category = self.category.trim().to_owned();
        self.sub_category = self.sub_category.trim().to_owned();
        self.sizes = self
            .sizes
            .into_iter()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        self.sizes.dedup();

        if self.name.is_empty() {
            return Err("Product name is required".to_owned());
        }
        if self.category.is_empty() {
            return Err("Product category is required".to_owned());
        }
        if self.sizes.is_empty() {
            return Err("At least one size is required".to_owned());
        }
        Ok(self)
    }
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Optional listing filters, taken from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub bestseller: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Whether a product passes every filter that is set.
    #[must_use]
    pub fn matches(&self, p: &ProductSummary) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| p.category.eq_ignore_ascii_case(c));
        let sub_ok = self
            .sub_category
            .as_deref()
            .is_none_or(|c| p.sub_category.eq_ignore_ascii_case(c));
        let search_ok = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .is_none_or(|s| p.name.to_lowercase().contains(&s.to_lowercase()));
        let bestseller_ok = self.bestseller.is_none_or(|b| p.bestseller == b);

        category_ok && sub_ok && search_ok && bestseller_ok
    }

    /// Order a listing in place.
    pub fn sort(&self, items: &mut [ProductSummary]) {
        match self.sort {
            ProductSort::Newest => {
                items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            }
            ProductSort::PriceAsc => items.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
            ProductSort::PriceDesc => {
                items.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id)));
            }
        }
    }
}
