//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lakshmi_core::{OrderId, OrderStatus, Price, ProductId, UserId};

/// Delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingInfo {
    /// Trim every field and check the required ones are present.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message naming the first missing field.
    pub fn normalized(self) -> Result<Self, String> {
        let info = Self {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            street: self.street.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
        };

        let required = [
            ("first name", &info.first_name),
            ("last name", &info.last_name),
            ("email", &info.email),
            ("phone", &info.phone),
            ("street", &info.street),
            ("city", &info.city),
            ("zip code", &info.zip_code),
            ("country", &info.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.is_empty()) {
            return Err(format!("Shipping {field} is required"));
        }
        if lakshmi_core::Email::parse(&info.email).is_err() {
            return Err("Shipping email is invalid".to_owned());
        }
        Ok(info)
    }
}

/// A line item frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub image: Option<String>,
}

impl OrderItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Immutable order snapshot; only `status` and `updated_at` change later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
    pub shipping: ShippingInfo,
    pub payment_ref: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for persisting an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
    pub shipping: ShippingInfo,
    pub payment_ref: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            first_name: " Asha ".to_owned(),
            last_name: "Rao".to_owned(),
            email: "asha@example.com".to_owned(),
            phone: "9999999999".to_owned(),
            street: "12 MG Road".to_owned(),
            city: "Pune".to_owned(),
            state: String::new(),
            zip_code: "411001".to_owned(),
            country: "India".to_owned(),
        }
    }

    #[test]
    fn test_shipping_trims_fields() {
        let info = shipping().normalized();
        assert_eq!(info.map(|i| i.first_name), Ok("Asha".to_owned()));
    }

    #[test]
    fn test_shipping_requires_fields() {
        let info = ShippingInfo {
            city: "  ".to_owned(),
            ..shipping()
        };
        assert_eq!(info.normalized(), Err("Shipping city is required".to_owned()));
    }

    #[test]
    fn test_shipping_rejects_bad_email() {
        let info = ShippingInfo {
            email: "nope".to_owned(),
            ..shipping()
        };
        assert!(info.normalized().is_err());
    }
}
