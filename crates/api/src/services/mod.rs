//! Business logic, one service per module.
//!
//! Services borrow what they need from [`AppState`](crate::state::AppState)
//! and are built per request.

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod email;
pub mod orders;
pub mod token;

pub use analytics::AnalyticsService;
pub use auth::{AuthService, AuthSession};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use email::{LogSender, ResetCodeSender, SmtpSender};
pub use orders::OrderService;
pub use token::TokenSigner;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::config::ApiConfig;
    use crate::models::ShippingInfo;
    use crate::state::AppState;
    use crate::store::Store;

    use super::LogSender;

    /// Token secret accepted by config validation.
    pub const TOKEN_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%vE8=";

    pub fn state_with(store: Arc<dyn Store>) -> AppState {
        let config = ApiConfig::from_vars(&|key: &str| match key {
            "STORE_BACKEND" => Some("memory".to_owned()),
            "TOKEN_SECRET" => Some(TOKEN_SECRET.to_owned()),
            _ => None,
        })
        .expect("test config");
        AppState::new(config, store, Arc::new(LogSender))
    }

    pub fn shipping() -> ShippingInfo {
        ShippingInfo {
            first_name: "Asha".to_owned(),
            last_name: "Rao".to_owned(),
            email: "asha@example.com".to_owned(),
            phone: "9999999999".to_owned(),
            street: "12 MG Road".to_owned(),
            city: "Pune".to_owned(),
            state: "MH".to_owned(),
            zip_code: "411001".to_owned(),
            country: "India".to_owned(),
        }
    }
}
