//! Lakshmi Client - storefront application layer.
//!
//! A typed client for the Lakshmi JSON API plus the state a storefront UI
//! renders from: the signed-in session, the login/signup screen, the product
//! screen and the cart. Rendering is left to the embedding UI; screens expose
//! their state and return an [`Effect`](screens::Effect) from every action.
//!
//! # Modules
//!
//! - [`api`] - `StorefrontApi` trait and its `reqwest` implementation
//! - [`storage`] - Persisted session token slot
//! - [`context`] - `ShopContext`, the injected application state
//! - [`screens`] - Per-screen state machines
//! - [`types`] - Wire types decoded from response envelopes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod context;
pub mod error;
pub mod screens;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{HttpApi, StorefrontApi};
pub use context::{DisplaySettings, SessionState, ShopContext};
pub use error::{ClientError, StorageError};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
