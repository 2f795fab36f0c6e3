//! Signed bearer tokens.
//!
//! HS256 JWTs keyed by `TOKEN_SECRET`. Tokens are self-contained; there is
//! no server-side revocation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lakshmi_core::{Role, UserId};

/// Why a token was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token could not be encoded")]
    Encode,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            _ => Self::Malformed,
        }
    }
}

/// Claims carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: Role,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Issues and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: SecretString, ttl_hours: u32) -> Self {
        Self {
            secret,
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }

    /// Issue a token for `user` valid from `now` for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if the claims cannot be signed.
    pub fn issue(&self, user: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());

        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|_| TokenError::Encode)
    }

    /// Verify a token's signature and expiry against the current time.
    ///
    /// # Errors
    ///
    /// Returns the first check that failed; callers treat all of them as
    /// "unauthenticated".
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let data = decode::<Claims>(token.trim(), &key, &Self::validation())?;
        Ok(data.claims)
    }
}
