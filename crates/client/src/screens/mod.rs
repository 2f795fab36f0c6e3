//! Screen state machines.
//!
//! Screens own their ephemeral state and borrow the [`ShopContext`] for each
//! action. Every action returns an [`Effect`] for the UI to apply. A failed
//! action leaves the screen's prior state untouched.
//!
//! [`ShopContext`]: crate::context::ShopContext

pub mod cart;
pub mod login;
pub mod product;

pub use cart::{CartScreen, CartTotals};
pub use login::{LoginMode, LoginScreen};
pub use product::{Dropdown, ProductScreen};

use lakshmi_core::ProductId;

use crate::error::ClientError;

/// Navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Product(ProductId),
    Cart,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl From<ClientError> for Notice {
    fn from(error: ClientError) -> Self {
        tracing::debug!(error = %error, "Action failed");
        Self::Error(error.user_message())
    }
}

/// What the UI should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Re-render in place.
    Stay,
    Navigate(Route),
    Notify(Notice),
}

impl Effect {
    pub(crate) fn success(message: &str) -> Self {
        Self::Notify(Notice::Success(message.to_owned()))
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self::Notify(Notice::Error(message.into()))
    }
}

impl From<ClientError> for Effect {
    fn from(error: ClientError) -> Self {
        Self::Notify(error.into())
    }
}
