//! Payload types decoded from API envelopes.
//!
//! Unknown fields are ignored so the server can grow its responses.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use lakshmi_core::{Price, ProductId, Role, UserId};

/// Result of a login or registration.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserInfo,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Product as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock: u32,
    #[serde(default)]
    pub bestseller: bool,
    #[serde(default)]
    pub review_count: u32,
}

/// Product detail with reviews.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    pub stock: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    pub username: String,
    /// Older servers send the body as `review`.
    #[serde(alias = "review")]
    pub text: String,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub image: Option<String>,
    pub stock: u32,
}

/// Listing filters sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub bestseller: Option<bool>,
}

impl ProductQuery {
    /// Query pairs for the parameters that are set.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(bestseller) = self.bestseller {
            pairs.push(("bestseller", bestseller.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_ignores_unknown_fields() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Ghee",
            "price": "12.50",
            "category": "Dairy",
            "sub_category": "Butter",
            "stock": 3,
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(product.id, ProductId::new(7));
        assert!(product.reviews.is_empty());
        assert_eq!(product.price.to_string(), "12.50");
    }

    #[test]
    fn test_review_accepts_both_field_spellings() {
        let current: Review = serde_json::from_value(serde_json::json!({
            "username": "Meera",
            "text": "Fragrant",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        let legacy: Review = serde_json::from_value(serde_json::json!({
            "username": "Meera",
            "review": "Fragrant",
            "createdAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(current, legacy);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session {
            token: "abc.def".to_owned(),
            user: UserInfo {
                id: UserId::new(1),
                name: "Asha".to_owned(),
                email: "asha@example.com".to_owned(),
                role: Role::Customer,
            },
        };
        assert!(!format!("{session:?}").contains("abc.def"));
    }
}
