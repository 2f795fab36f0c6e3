//! Cart screen.

use lakshmi_core::{Price, ProductId};

use crate::context::ShopContext;
use crate::error::ClientError;
use crate::types::Cart;

use super::Effect;

/// Amounts shown under the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

#[derive(Debug, Clone, Default)]
pub struct CartScreen {
    cart: Cart,
}

impl CartScreen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Totals with the delivery fee; an empty cart owes nothing.
    #[must_use]
    pub fn totals(&self, ctx: &ShopContext) -> CartTotals {
        let subtotal = self.cart.subtotal;
        let delivery_fee = if self.cart.lines.is_empty() {
            Price::ZERO
        } else {
            ctx.settings().delivery_fee
        };
        CartTotals {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }

    pub async fn load(&mut self, ctx: &ShopContext) -> Effect {
        let result = match ctx.require_token() {
            Ok(token) => ctx.api().cart(token).await,
            Err(e) => Err(e),
        };
        self.apply(result, None)
    }

    /// Change a line's quantity; `0` removes the line.
    pub async fn set_quantity(
        &mut self,
        ctx: &ShopContext,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Effect {
        let result = match ctx.require_token() {
            Ok(token) => {
                ctx.api()
                    .update_cart(token, product_id, size, quantity)
                    .await
            }
            Err(e) => Err(e),
        };
        self.apply(result, None)
    }

    pub async fn remove(&mut self, ctx: &ShopContext, product_id: ProductId, size: &str) -> Effect {
        let result = match ctx.require_token() {
            Ok(token) => ctx.api().remove_from_cart(token, product_id, size).await,
            Err(e) => Err(e),
        };
        self.apply(result, Some("Removed from cart"))
    }

    fn apply(&mut self, result: Result<Cart, ClientError>, message: Option<&str>) -> Effect {
        match result {
            Ok(cart) => {
                self.cart = cart;
                message.map_or(Effect::Stay, Effect::success)
            }
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::screens::Notice;
    use crate::testing::{FakeApi, signed_in};

    #[tokio::test]
    async fn test_totals_include_delivery_fee() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, _) = signed_in(api);
        let mut screen = CartScreen::new();

        screen.load(&ctx).await;
        assert_eq!(screen.totals(&ctx).total, Price::ZERO);

        ctx.api()
            .add_to_cart(ctx.token().unwrap(), id, "100g", 2)
            .await
            .unwrap();
        screen.load(&ctx).await;
        let totals = screen.totals(&ctx);
        assert_eq!(totals.subtotal, Price::from_units(40));
        assert_eq!(totals.delivery_fee, Price::from_units(10));
        assert_eq!(totals.total, Price::from_units(50));
    }

    #[tokio::test]
    async fn test_over_stock_update_keeps_cart() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, _) = signed_in(api);
        let mut screen = CartScreen::new();
        screen.set_quantity(&ctx, id, "100g", 1).await;

        let effect = screen.set_quantity(&ctx, id, "100g", 5).await;
        assert_eq!(
            effect,
            Effect::Notify(Notice::Error(
                "Only 3 left in stock for Turmeric".to_owned()
            ))
        );
        assert_eq!(screen.cart().lines[0].quantity, 1);

        screen.set_quantity(&ctx, id, "100g", 0).await;
        assert!(screen.cart().lines.is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_line_keeps_size() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, _) = signed_in(api);
        let mut screen = CartScreen::new();
        screen.set_quantity(&ctx, id, "100g", 1).await;

        let effect = screen.remove(&ctx, id, "250g").await;
        assert_eq!(effect, Effect::success("Removed from cart"));
        assert_eq!(screen.cart().lines.len(), 1);
    }
}
