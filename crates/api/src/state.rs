//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::services::email::ResetCodeSender;
use crate::services::token::TokenSigner;
use crate::store::Store;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the token signer, the reset code sender and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    tokens: TokenSigner,
    mailer: Arc<dyn ResetCodeSender>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Persisted store (Postgres or in-memory)
    /// * `mailer` - Delivery channel for password reset codes
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn Store>, mailer: Arc<dyn ResetCodeSender>) -> Self {
        let tokens = TokenSigner::new(config.token_secret.clone(), config.token_ttl_hours);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
                mailer,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }

    /// Get a reference to the reset code sender.
    #[must_use]
    pub fn mailer(&self) -> &dyn ResetCodeSender {
        self.inner.mailer.as_ref()
    }
}
