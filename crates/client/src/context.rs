//! Injected application state shared by the screens.
//!
//! A `ShopContext` is built once by the embedding UI and passed to every
//! screen action. The session is derived from the token slot at startup and
//! kept in step with it afterwards.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use lakshmi_core::Price;

use crate::api::StorefrontApi;
use crate::error::ClientError;
use crate::storage::TokenStorage;
use crate::types::{ProductQuery, ProductSummary, Session, UserInfo};

/// Where the shopper stands with authentication.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No stored credential.
    AnonymousBrowsing,
    /// A login or registration request is in flight.
    Authenticating,
    /// A credential is stored.
    Authenticated { token: String },
}

impl SessionState {
    fn from_token(token: Option<String>) -> Self {
        token.map_or(Self::AnonymousBrowsing, |token| Self::Authenticated { token })
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnonymousBrowsing => f.write_str("AnonymousBrowsing"),
            Self::Authenticating => f.write_str("Authenticating"),
            Self::Authenticated { .. } => f
                .debug_struct("Authenticated")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}

/// How prices and totals are shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub currency: String,
    /// Flat fee added to non-empty carts; mirrors the server's `DELIVERY_FEE`.
    pub delivery_fee: Price,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency: "$".to_owned(),
            delivery_fee: Price::from_units(10),
        }
    }
}

/// Application state passed to every screen.
pub struct ShopContext {
    api: Arc<dyn StorefrontApi>,
    storage: Arc<dyn TokenStorage>,
    settings: DisplaySettings,
    session: SessionState,
    user: Option<UserInfo>,
    catalog: Vec<ProductSummary>,
}

impl ShopContext {
    /// Build the context, restoring any stored session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the token slot cannot be read.
    pub fn new(
        api: Arc<dyn StorefrontApi>,
        storage: Arc<dyn TokenStorage>,
        settings: DisplaySettings,
    ) -> Result<Self, ClientError> {
        let session = SessionState::from_token(storage.load()?);
        Ok(Self {
            api,
            storage,
            settings,
            session,
            user: None,
            catalog: Vec::new(),
        })
    }

    #[must_use]
    pub fn api(&self) -> &dyn StorefrontApi {
        self.api.as_ref()
    }

    #[must_use]
    pub const fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// The user from this run's login or registration, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    /// The stored token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match &self.session {
            SessionState::Authenticated { token } => Some(token),
            _ => None,
        }
    }

    /// The stored token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotSignedIn` without a session.
    pub fn require_token(&self) -> Result<&str, ClientError> {
        self.token().ok_or(ClientError::NotSignedIn)
    }

    /// Format a price with the configured currency symbol.
    #[must_use]
    pub fn format_price(&self, price: Price) -> String {
        price.display_with(&self.settings.currency)
    }

    /// Last fetched product listing.
    #[must_use]
    pub fn catalog(&self) -> &[ProductSummary] {
        &self.catalog
    }

    /// Refetch the product listing. The previous listing is kept on failure.
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails.
    pub async fn refresh_catalog(&mut self, query: &ProductQuery) -> Result<(), ClientError> {
        self.catalog = self.api.list_products(query).await?;
        Ok(())
    }

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns error if the API rejects the login or the token cannot be
    /// stored. The session falls back to its previous state.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&UserInfo, ClientError> {
        let previous = std::mem::replace(&mut self.session, SessionState::Authenticating);
        let result = self.api.login(email, password).await;
        self.establish(previous, result)
    }

    /// Register and persist the session.
    ///
    /// # Errors
    ///
    /// Returns error if the API rejects the registration or the token cannot
    /// be stored. The session falls back to its previous state.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&UserInfo, ClientError> {
        let previous = std::mem::replace(&mut self.session, SessionState::Authenticating);
        let result = self.api.register(name, email, password).await;
        self.establish(previous, result)
    }

    fn establish(
        &mut self,
        previous: SessionState,
        result: Result<Session, ClientError>,
    ) -> Result<&UserInfo, ClientError> {
        let saved = result.and_then(|session| {
            self.storage.save(&session.token)?;
            Ok(session)
        });
        let session = match saved {
            Ok(session) => session,
            Err(e) => {
                self.session = previous;
                return Err(e);
            }
        };

        info!(user_id = %session.user.id, "Signed in");
        self.session = SessionState::Authenticated {
            token: session.token,
        };
        Ok(self.user.insert(session.user))
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the slot cannot be cleared; the
    /// in-memory session is dropped regardless.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.session = SessionState::AnonymousBrowsing;
        self.user = None;
        self.storage.clear().map_err(|e| {
            warn!(error = %e, "Failed to clear stored token");
            e.into()
        })
    }
}
