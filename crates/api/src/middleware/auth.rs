//! Authentication extractors.
//!
//! The bearer token is read from, in order: `Authorization: Bearer <t>`,
//! `token: <t>`, `auth-token: <t>`.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Legacy token headers, checked after `Authorization`.
const TOKEN_HEADERS: [&str; 2] = ["token", "auth-token"];

/// Pull the raw token from the request headers.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let from_authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    from_authorization
        .or_else(|| {
            TOKEN_HEADERS
                .iter()
                .find_map(|name| headers.get(*name).and_then(|h| h.to_str().ok()))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let user = AuthService::new(state).authenticate(token).await?;

        tracing::Span::current().record("user_id", user.id.as_i64());
        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

/// Extractor that requires a signed-in admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin hit admin endpoint");
            return Err(AppError::Forbidden);
        }
        Ok(Self(user))
    }
}
