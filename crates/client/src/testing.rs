//! In-process `StorefrontApi` for screen and context tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use lakshmi_core::{Price, ProductId, Role, UserId};

use crate::api::StorefrontApi;
use crate::context::{DisplaySettings, ShopContext};
use crate::error::ClientError;
use crate::storage::MemoryTokenStorage;
use crate::types::{Cart, CartLine, Product, ProductQuery, ProductSummary, Review, Session, UserInfo};

pub const PASSWORD: &str = "Secret#123";
pub const RESET_CODE: &str = "123456";

#[derive(Default)]
struct FakeState {
    password: Option<String>,
    products: BTreeMap<ProductId, Product>,
    cart: Vec<(ProductId, String, u32)>,
    calls: Vec<&'static str>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

fn api_error(message: impl Into<String>) -> ClientError {
    ClientError::Api(message.into())
}

fn session(email: &str) -> Session {
    Session {
        token: format!("token-for-{email}"),
        user: UserInfo {
            id: UserId::new(1),
            name: "Asha".to_owned(),
            email: email.to_owned(),
            role: Role::Customer,
        },
    }
}

impl FakeApi {
    pub fn add_product(&self, name: &str, stock: u32) -> ProductId {
        let mut state = self.state.lock();
        let id = ProductId::new(i64::try_from(state.products.len()).unwrap_or(0) + 1);
        state.products.insert(
            id,
            Product {
                id,
                name: name.to_owned(),
                description: String::new(),
                price: Price::from_units(20),
                category: "Spices".to_owned(),
                images: vec![format!("{name}-1.jpg"), format!("{name}-2.jpg")],
                sizes: vec!["100g".to_owned(), "250g".to_owned()],
                stock,
                reviews: Vec::new(),
            },
        );
        id
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn review_count(&self, id: ProductId) -> usize {
        self.state
            .lock()
            .products
            .get(&id)
            .map_or(0, |p| p.reviews.len())
    }

    fn record(&self, call: &'static str) {
        self.state.lock().calls.push(call);
    }

    fn cart_view(state: &FakeState) -> Cart {
        let lines: Vec<CartLine> = state
            .cart
            .iter()
            .filter_map(|(id, size, quantity)| {
                let p = state.products.get(id)?;
                Some(CartLine {
                    product_id: *id,
                    name: p.name.clone(),
                    size: size.clone(),
                    quantity: *quantity,
                    unit_price: p.price,
                    line_total: p.price.times(*quantity),
                    image: p.images.first().cloned(),
                    stock: p.stock,
                })
            })
            .collect();
        Cart {
            item_count: lines.iter().map(|l| l.quantity).sum(),
            subtotal: lines.iter().map(|l| l.line_total).sum(),
            lines,
        }
    }

    fn set_line(&self, product_id: ProductId, size: &str, quantity: u32, merge: bool) -> Result<Cart, ClientError> {
        let mut state = self.state.lock();
        let product = state
            .products
            .get(&product_id)
            .ok_or_else(|| api_error("Product not found"))?;
        if quantity > product.stock {
            return Err(api_error(format!(
                "Only {} left in stock for {}",
                product.stock, product.name
            )));
        }
        let stock = product.stock;

        if let Some(line) = state
            .cart
            .iter_mut()
            .find(|(id, s, _)| *id == product_id && s == size)
        {
            line.2 = if merge { (line.2 + quantity).min(stock) } else { quantity };
        } else {
            state.cart.push((product_id, size.to_owned(), quantity));
        }
        Ok(Self::cart_view(&state))
    }
}

#[async_trait]
impl StorefrontApi for FakeApi {
    async fn register(&self, _name: &str, email: &str, _password: &str) -> Result<Session, ClientError> {
        self.record("register");
        if email == "taken@example.com" {
            return Err(api_error("User already exists"));
        }
        Ok(session(email))
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.record("login");
        let state = self.state.lock();
        let expected = state.password.as_deref().unwrap_or(PASSWORD);
        if password != expected {
            return Err(api_error("Invalid credentials"));
        }
        Ok(session(email))
    }

    async fn request_password_reset(&self, _email: &str) -> Result<(), ClientError> {
        self.record("request_password_reset");
        Ok(())
    }

    async fn reset_password(&self, _email: &str, new_password: &str, code: &str) -> Result<(), ClientError> {
        self.record("reset_password");
        if code != RESET_CODE {
            return Err(api_error("Invalid or expired reset code"));
        }
        self.state.lock().password = Some(new_password.to_owned());
        Ok(())
    }

    async fn list_products(&self, _query: &ProductQuery) -> Result<Vec<ProductSummary>, ClientError> {
        self.record("list_products");
        Ok(self
            .state
            .lock()
            .products
            .values()
            .map(|p| ProductSummary {
                id: p.id,
                name: p.name.clone(),
                price: p.price,
                category: p.category.clone(),
                images: p.images.clone(),
                stock: p.stock,
                bestseller: false,
                review_count: u32::try_from(p.reviews.len()).unwrap_or(u32::MAX),
            })
            .collect())
    }

    async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        self.record("product");
        self.state
            .lock()
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| api_error("Product not found"))
    }

    async fn related_products(&self, _id: ProductId) -> Result<Vec<ProductSummary>, ClientError> {
        self.record("related_products");
        Ok(Vec::new())
    }

    async fn add_review(&self, _token: &str, id: ProductId, text: &str) -> Result<Review, ClientError> {
        self.record("add_review");
        let text = text.trim();
        if text.is_empty() {
            return Err(api_error("Review cannot be empty"));
        }
        let review = Review {
            username: "Asha".to_owned(),
            text: text.to_owned(),
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .products
            .get_mut(&id)
            .ok_or_else(|| api_error("Product not found"))?
            .reviews
            .push(review.clone());
        Ok(review)
    }

    async fn cart(&self, _token: &str) -> Result<Cart, ClientError> {
        self.record("cart");
        Ok(Self::cart_view(&self.state.lock()))
    }

    async fn add_to_cart(
        &self,
        _token: &str,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, ClientError> {
        self.record("add_to_cart");
        self.set_line(product_id, size, quantity, true)
    }

    async fn update_cart(
        &self,
        token: &str,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, ClientError> {
        self.record("update_cart");
        if quantity == 0 {
            return self.remove_from_cart(token, product_id, size).await;
        }
        self.set_line(product_id, size, quantity, false)
    }

    async fn remove_from_cart(&self, _token: &str, product_id: ProductId, size: &str) -> Result<Cart, ClientError> {
        self.record("remove_from_cart");
        let mut state = self.state.lock();
        state.cart.retain(|(id, s, _)| !(*id == product_id && s == size));
        Ok(Self::cart_view(&state))
    }
}

/// A context over `api` with empty in-memory token storage.
pub fn context_with(api: FakeApi) -> (ShopContext, Arc<FakeApi>, Arc<MemoryTokenStorage>) {
    let api = Arc::new(api);
    let storage = Arc::new(MemoryTokenStorage::new());
    let ctx = ShopContext::new(api.clone(), storage.clone(), DisplaySettings::default())
        .unwrap_or_else(|e| panic!("memory storage cannot fail: {e}"));
    (ctx, api, storage)
}

/// A signed-in context over `api`.
pub fn signed_in(api: FakeApi) -> (ShopContext, Arc<FakeApi>) {
    let api = Arc::new(api);
    let storage = Arc::new(MemoryTokenStorage::with_token("token-for-asha@example.com"));
    let ctx = ShopContext::new(api.clone(), storage, DisplaySettings::default())
        .unwrap_or_else(|e| panic!("memory storage cannot fail: {e}"));
    (ctx, api)
}
