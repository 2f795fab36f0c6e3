//! Cart types.

use serde::Serialize;

use lakshmi_core::{Price, ProductId};

/// One stored cart line: a (product, size) pairing with a quantity ≥ 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
}

/// A cart line resolved against the live product for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub image: Option<String>,
    /// Live stock, so the client can cap its quantity selector.
    pub stock: u32,
}

/// A user's cart as shown to the client.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Price,
}

impl CartView {
    /// Build a view from resolved lines, computing the totals.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLineView>) -> Self {
        let item_count = lines.iter().map(|l| l.quantity).sum();
        let subtotal = lines.iter().map(|l| l.line_total).sum();
        Self {
            lines,
            item_count,
            subtotal,
        }
    }
}
