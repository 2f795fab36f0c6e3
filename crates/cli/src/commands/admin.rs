//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! lakshmi-cli admin create -e admin@example.com -n "Admin Name" -p 'S3cure#pass'
//! ```
//!
//! The password may also come from `LAKSHMI_ADMIN_PASSWORD` to keep it out
//! of shell history.

use lakshmi_api::models::NewUser;
use lakshmi_api::services::auth::hash_password;
use lakshmi_api::store::{StoreError, UserStore};
use lakshmi_core::{Email, PASSWORD_POLICY_MESSAGE, Role, UserId, validate_password};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Name is required")]
    MissingName,

    #[error("{PASSWORD_POLICY_MESSAGE}")]
    WeakPassword,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("User already exists with email: {0}")]
    UserExists(String),
}

/// Check the inputs before touching the database.
fn validate(email: &str, name: &str, password: &str) -> Result<Email, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    if name.trim().is_empty() {
        return Err(AdminError::MissingName);
    }
    validate_password(password).map_err(|_| AdminError::WeakPassword)?;
    Ok(email)
}

/// Create a new admin user.
///
/// # Errors
///
/// Returns an error for invalid input, an existing account, or a database failure.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = validate(email, name, password)?;
    let password_hash = hash_password(password).map_err(|e| AdminError::Hash(e.to_string()))?;

    let store = connect().await?;

    tracing::info!("Creating admin user: {}", email);

    let user = store
        .create_user(NewUser {
            name: name.trim(),
            email: &email,
            password_hash: &password_hash,
            role: Role::Admin,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            validate("nope", "Admin", "S3cure#pass"),
            Err(AdminError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate("admin@example.com", "  ", "S3cure#pass"),
            Err(AdminError::MissingName)
        ));
        assert!(matches!(
            validate("admin@example.com", "Admin", "abcd1234"),
            Err(AdminError::WeakPassword)
        ));
    }

    #[test]
    fn test_validate_normalizes_email() {
        let email = validate("Admin@Example.com", "Admin", "abcd12!@").unwrap();
        assert_eq!(email.as_str(), "admin@example.com");
    }
}
