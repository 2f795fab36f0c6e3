//! Unified error handling with Sentry integration.
//!
//! Every service returns `Result<T, AppError>`. The gateway renders the
//! error as a `{success: false, message}` envelope. Handled failures keep
//! HTTP 200 so clients branch on `success`; only store outages and internal
//! faults change the status code, and only those are sent to Sentry.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use lakshmi_core::{Envelope, OrderStatus};

use crate::store::StoreError;

/// Message returned for store outages; details stay in the logs.
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation; the message is shown to the user.
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, badly signed or expired token.
    #[error("Not Authorized Login Again")]
    Unauthenticated,

    /// Authenticated but not an admin.
    #[error("Admin access required")]
    Forbidden,

    /// Resource not found; carries the full user-facing message.
    #[error("{0}")]
    NotFound(String),

    #[error("Only {available} left in stock for {product}")]
    OutOfStock { product: String, available: u32 },

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The store failed unexpectedly.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Internal server error (hashing failures, panics).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err)
    }
}

impl AppError {
    /// Convenience constructor for validation failures.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Convenience constructor for not-found failures.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }

    /// Message safe to show to clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::StoreUnavailable(_) => UNAVAILABLE_MESSAGE.to_owned(),
            Self::Internal(_) => "Internal server error".to_owned(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::StoreUnavailable(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Handled request failure");
        }

        let body = Envelope::<()>::failure(self.public_message());
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called by the auth extractors once a token resolves to a user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
