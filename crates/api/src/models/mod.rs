//! Domain models for the storefront API.
//!
//! These types are the validated domain objects that services exchange with
//! the [`Store`](crate::store::Store) and serialize into response envelopes.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{CartLine, CartLineView, CartView};
pub use order::{NewOrder, Order, OrderItem, ShippingInfo};
pub use product::{NewProduct, NewReview, Product, ProductFilter, ProductSort, ProductSummary, Review};
pub use user::{NewUser, User, UserView};
