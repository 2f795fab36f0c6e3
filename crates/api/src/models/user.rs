//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use lakshmi_core::{Email, Role, UserId};

/// A storefront account.
///
/// The password hash is deliberately not part of this type; the store hands
/// it out separately and only to the login path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name, denormalised onto reviews.
    pub name: String,
    /// Login identity.
    pub email: Email,
    /// Customer or admin.
    pub role: Role,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may use admin endpoints.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub role: Role,
}

/// Public projection of a user returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
