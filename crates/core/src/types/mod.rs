//! Core types for the Lakshmi storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod envelope;
pub mod id;
pub mod password;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use envelope::Envelope;
pub use id::*;
pub use password::{
    MIN_PASSWORD_LENGTH, PASSWORD_POLICY_MESSAGE, PASSWORD_SYMBOLS, PasswordError, validate_password,
};
pub use price::{Price, PriceError};
pub use status::*;
