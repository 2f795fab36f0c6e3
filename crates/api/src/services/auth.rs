//! Authentication service.
//!
//! Password registration and login, bearer token resolution, password
//! reset and profile edits.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use lakshmi_core::{Email, PASSWORD_POLICY_MESSAGE, Role, validate_password};

use crate::config::PasswordResetMode;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserView};
use crate::services::email::{ResetCodeSender, generate_reset_code};
use crate::services::token::TokenSigner;
use crate::state::AppState;
use crate::store::{Store, StoreError, UserStore};

/// How long a reset code stays valid.
const RESET_CODE_TTL_MINUTES: i64 = 15;

/// Longest accepted display name.
const MAX_NAME_LENGTH: usize = 100;

/// A freshly issued token together with the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserView,
}

/// Authentication service.
///
/// Constructed per request from borrowed application state.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenSigner,
    mailer: &'a dyn ResetCodeSender,
    reset_mode: PasswordResetMode,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            store: state.store(),
            tokens: state.tokens(),
            mailer: state.mailer(),
            reset_mode: state.config().password_reset_mode,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new customer and sign them in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad email, empty name or weak password.
    /// Returns `AppError::DuplicateEmail` if the email is already registered.
    #[instrument(skip(self, name, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        let email = parse_email(email)?;
        let name = validate_name(name)?;
        validate_password(password).map_err(|_| AppError::validation(PASSWORD_POLICY_MESSAGE))?;

        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(NewUser {
                name,
                email: &email,
                password_hash: &password_hash,
                role: Role::Customer,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AppError::DuplicateEmail,
                other => AppError::from(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidCredentials` if the email is unknown or the
    /// password does not match; the two cases are indistinguishable.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = Email::parse(email).map_err(|_| AppError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .credentials_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        self.session_for(&user)
    }

    /// Resolve a bearer token to its user. Fails closed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthenticated` for a missing, malformed, badly
    /// signed or expired token, or one whose user no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AppError::Unauthenticated
        })?;

        self.store
            .user_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated)
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        let token = self
            .tokens
            .issue(user.id, user.role, Utc::now())
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

        Ok(AuthSession {
            token,
            user: UserView::from(user),
        })
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a reset code and mail it.
    ///
    /// Succeeds for unknown emails too, so callers cannot probe for accounts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the email is malformed.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = parse_email(email)?;

        let Some(user) = self.store.user_by_email(&email).await? else {
            tracing::info!("Reset requested for unknown email");
            return Ok(());
        };

        let code = generate_reset_code();
        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);
        self.store
            .put_reset_code(user.id, &hash_reset_code(&code), expires_at)
            .await?;

        if let Err(e) = self.mailer.send_reset_code(&user.email, &user.name, &code).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to deliver reset code");
        }
        Ok(())
    }

    /// Replace a user's password.
    ///
    /// In `code` mode a code from [`request_password_reset`](Self::request_password_reset)
    /// is required and consumed, even when it does not match.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no user has this email.
    /// Returns `AppError::Validation` for a weak password or a missing, wrong
    /// or expired code.
    #[instrument(skip(self, new_password, code))]
    pub async fn forgot_password(
        &self,
        email: &str,
        new_password: &str,
        code: Option<&str>,
    ) -> Result<()> {
        let email = parse_email(email)?;
        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        validate_password(new_password)
            .map_err(|_| AppError::validation(PASSWORD_POLICY_MESSAGE))?;

        match self.reset_mode {
            PasswordResetMode::Code => {
                let code = code
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| AppError::validation("Reset code is required"))?;
                self.consume_reset_code(&user, code).await?;
            }
            PasswordResetMode::EmailOnly => {
                tracing::warn!(
                    user_id = %user.id,
                    "Password reset without verification (PASSWORD_RESET_MODE=email_only)"
                );
            }
        }

        let password_hash = hash_password(new_password)?;
        self.store.set_password_hash(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn consume_reset_code(&self, user: &User, code: &str) -> Result<()> {
        let invalid = || AppError::validation("Invalid or expired reset code");

        let (stored_hash, expires_at) = self
            .store
            .take_reset_code(user.id)
            .await?
            .ok_or_else(invalid)?;

        if expires_at <= Utc::now() || stored_hash != hash_reset_code(code) {
            return Err(invalid());
        }
        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Public view of the signed-in user.
    #[must_use]
    pub fn profile(user: &User) -> UserView {
        UserView::from(user)
    }

    /// Change the signed-in user's display name.
    ///
    /// Reviews keep the name they were written under.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the name is empty or too long.
    #[instrument(skip(self, user, name), fields(user_id = %user.id))]
    pub async fn update_profile(&self, user: &User, name: &str) -> Result<UserView> {
        let name = validate_name(name)?;
        let updated = self.store.set_name(user.id, name).await?;
        Ok(UserView::from(&updated))
    }
}

fn parse_email(email: &str) -> Result<Email> {
    Email::parse(email).map_err(|_| AppError::validation("Please enter a valid email"))
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

fn hash_reset_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AppError::Internal` if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AppError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("abcd12!@").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("abcd12!@", &hash).is_ok());
        assert!(matches!(
            verify_password("abcd12!#", &hash),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("abcd12!@").unwrap(),
            hash_password("abcd12!@").unwrap()
        );
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Asha ").unwrap(), "Asha");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_reset_code_hash_is_stable_hex() {
        let hash = hash_reset_code("123456");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_reset_code("123456"));
        assert_ne!(hash, hash_reset_code("654321"));
    }
}
