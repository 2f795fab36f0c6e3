//! Product detail screen: images, size picker, quantity, reviews.

use lakshmi_core::ProductId;

use crate::context::ShopContext;
use crate::types::{Product, ProductSummary};

use super::Effect;

/// Size picker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dropdown {
    Open,
    #[default]
    Closed,
}

impl Dropdown {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductScreen {
    product_id: ProductId,
    product: Option<Product>,
    related: Vec<ProductSummary>,
    selected_image: Option<String>,
    selected_size: Option<String>,
    quantity: u32,
    size_dropdown: Dropdown,
    pub review_draft: String,
}

impl ProductScreen {
    #[must_use]
    pub const fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            product: None,
            related: Vec::new(),
            selected_image: None,
            selected_size: None,
            quantity: 1,
            size_dropdown: Dropdown::Closed,
            review_draft: String::new(),
        }
    }

    #[must_use]
    pub const fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    #[must_use]
    pub fn related(&self) -> &[ProductSummary] {
        &self.related
    }

    #[must_use]
    pub fn selected_image(&self) -> Option<&str> {
        self.selected_image.as_deref()
    }

    #[must_use]
    pub fn selected_size(&self) -> Option<&str> {
        self.selected_size.as_deref()
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub const fn size_dropdown(&self) -> Dropdown {
        self.size_dropdown
    }

    /// Price label in the configured currency.
    #[must_use]
    pub fn price_label(&self, ctx: &ShopContext) -> Option<String> {
        self.product.as_ref().map(|p| ctx.format_price(p.price))
    }

    /// Fetch the product and its related items.
    ///
    /// Selections that still apply are kept; the rest reset to defaults.
    pub async fn load(&mut self, ctx: &ShopContext) -> Effect {
        let product = match ctx.api().product(self.product_id).await {
            Ok(product) => product,
            Err(e) => return e.into(),
        };
        match ctx.api().related_products(self.product_id).await {
            Ok(related) => self.related = related,
            Err(e) => tracing::debug!(error = %e, "Related products unavailable"),
        }

        if !self
            .selected_image
            .as_ref()
            .is_some_and(|img| product.images.contains(img))
        {
            self.selected_image = product.images.first().cloned();
        }
        if !self
            .selected_size
            .as_ref()
            .is_some_and(|size| product.sizes.contains(size))
        {
            self.selected_size = None;
        }
        self.quantity = clamp_quantity(self.quantity, product.stock);
        self.product = Some(product);
        Effect::Stay
    }

    /// Show `image` as the main image if it belongs to the product.
    pub fn select_image(&mut self, image: &str) {
        if let Some(product) = &self.product
            && product.images.iter().any(|i| i == image)
        {
            self.selected_image = Some(image.to_owned());
        }
    }

    pub const fn toggle_dropdown(&mut self) {
        self.size_dropdown = self.size_dropdown.toggled();
    }

    /// Pick a size; closes the picker. Unknown sizes are ignored.
    pub fn select_size(&mut self, size: &str) {
        if let Some(product) = &self.product
            && product.sizes.iter().any(|s| s == size)
        {
            self.selected_size = Some(size.to_owned());
            self.size_dropdown = Dropdown::Closed;
        }
    }

    /// Set the quantity, clamped to what is in stock.
    pub fn set_quantity(&mut self, quantity: u32) {
        let stock = self.product.as_ref().map_or(0, |p| p.stock);
        self.quantity = clamp_quantity(quantity, stock);
    }

    pub fn increment(&mut self) {
        self.set_quantity(self.quantity.saturating_add(1));
    }

    pub fn decrement(&mut self) {
        self.set_quantity(self.quantity.saturating_sub(1));
    }

    /// Post the review draft, then refetch the product to show it.
    pub async fn submit_review(&mut self, ctx: &ShopContext) -> Effect {
        let token = match ctx.require_token() {
            Ok(token) => token,
            Err(e) => return e.into(),
        };
        if self.review_draft.trim().is_empty() {
            return Effect::error("Review cannot be empty");
        }

        if let Err(e) = ctx
            .api()
            .add_review(token, self.product_id, &self.review_draft)
            .await
        {
            return e.into();
        }

        self.review_draft.clear();
        match self.load(ctx).await {
            Effect::Stay => Effect::success("Review added"),
            other => other,
        }
    }

    /// Add the selected size and quantity to the cart.
    pub async fn add_to_cart(&self, ctx: &ShopContext) -> Effect {
        let token = match ctx.require_token() {
            Ok(token) => token,
            Err(e) => return e.into(),
        };
        let Some(size) = self.selected_size.as_deref() else {
            return Effect::error("Please select a size");
        };
        if self.quantity == 0 {
            return Effect::error("This product is out of stock");
        }

        match ctx
            .api()
            .add_to_cart(token, self.product_id, size, self.quantity)
            .await
        {
            Ok(_) => Effect::success("Added to cart"),
            Err(e) => e.into(),
        }
    }
}

/// Zero when nothing is in stock, otherwise within `[1, stock]`.
const fn clamp_quantity(quantity: u32, stock: u32) -> u32 {
    if stock == 0 {
        0
    } else if quantity < 1 {
        1
    } else if quantity > stock {
        stock
    } else {
        quantity
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SIGN_IN_MESSAGE;
    use crate::screens::Notice;
    use crate::testing::{FakeApi, context_with, signed_in};

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(5, 0), 0);
        assert_eq!(clamp_quantity(0, 3), 1);
        assert_eq!(clamp_quantity(9, 3), 3);
        assert_eq!(clamp_quantity(2, 3), 2);
    }

    #[tokio::test]
    async fn test_load_defaults_to_first_image() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, _) = signed_in(api);
        let mut screen = ProductScreen::new(id);

        assert_eq!(screen.load(&ctx).await, Effect::Stay);
        assert_eq!(screen.selected_image(), Some("Turmeric-1.jpg"));
        assert_eq!(screen.price_label(&ctx).as_deref(), Some("$20.00"));

        screen.select_image("Turmeric-2.jpg");
        screen.select_image("elsewhere.jpg");
        assert_eq!(screen.selected_image(), Some("Turmeric-2.jpg"));
    }

    #[tokio::test]
    async fn test_quantity_follows_stock() {
        let api = FakeApi::default();
        let sold_out = api.add_product("Saffron", 0);
        let id = api.add_product("Turmeric", 3);
        let (ctx, _) = signed_in(api);

        let mut screen = ProductScreen::new(sold_out);
        screen.load(&ctx).await;
        assert_eq!(screen.quantity(), 0);
        screen.increment();
        assert_eq!(screen.quantity(), 0);

        let mut screen = ProductScreen::new(id);
        screen.load(&ctx).await;
        screen.set_quantity(10);
        assert_eq!(screen.quantity(), 3);
        screen.decrement();
        screen.decrement();
        screen.decrement();
        assert_eq!(screen.quantity(), 1);
    }

    #[tokio::test]
    async fn test_size_dropdown() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, _) = signed_in(api);
        let mut screen = ProductScreen::new(id);
        screen.load(&ctx).await;

        screen.toggle_dropdown();
        assert_eq!(screen.size_dropdown(), Dropdown::Open);
        screen.select_size("1kg");
        assert_eq!(screen.selected_size(), None);
        assert_eq!(screen.size_dropdown(), Dropdown::Open);

        screen.select_size("250g");
        assert_eq!(screen.selected_size(), Some("250g"));
        assert_eq!(screen.size_dropdown(), Dropdown::Closed);
    }

    #[tokio::test]
    async fn test_add_to_cart_requires_size() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, api) = signed_in(api);
        let mut screen = ProductScreen::new(id);
        screen.load(&ctx).await;

        assert_eq!(
            screen.add_to_cart(&ctx).await,
            Effect::Notify(Notice::Error("Please select a size".to_owned()))
        );
        assert!(!api.calls().contains(&"add_to_cart"));

        screen.select_size("100g");
        screen.set_quantity(2);
        assert_eq!(screen.add_to_cart(&ctx).await, Effect::success("Added to cart"));
    }

    #[tokio::test]
    async fn test_review_refetches_product() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, api) = signed_in(api);
        let mut screen = ProductScreen::new(id);
        screen.load(&ctx).await;

        screen.review_draft = "Fresh and bright".to_owned();
        assert_eq!(screen.submit_review(&ctx).await, Effect::success("Review added"));
        assert!(screen.review_draft.is_empty());

        let reviews = &screen.product().unwrap().reviews;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].username, "Asha");
        assert_eq!(api.calls().iter().filter(|c| **c == "product").count(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_review_is_rejected() {
        let api = FakeApi::default();
        let id = api.add_product("Turmeric", 3);
        let (ctx, api, _) = context_with(api);
        let mut screen = ProductScreen::new(id);
        screen.load(&ctx).await;
        screen.review_draft = "Lovely".to_owned();

        assert_eq!(
            screen.submit_review(&ctx).await,
            Effect::Notify(Notice::Error(SIGN_IN_MESSAGE.to_owned()))
        );
        assert_eq!(screen.review_draft, "Lovely");
        assert_eq!(api.review_count(id), 0);
    }

    #[tokio::test]
    async fn test_missing_product_notifies() {
        let (ctx, _) = signed_in(FakeApi::default());
        let mut screen = ProductScreen::new(ProductId::new(42));

        assert_eq!(
            screen.load(&ctx).await,
            Effect::Notify(Notice::Error("Product not found".to_owned()))
        );
        assert!(screen.product().is_none());
    }
}
