//! Lakshmi Core - Shared domain types.
//!
//! This crate provides the types shared by every Lakshmi component:
//! - `api` - JSON HTTP backend (auth, catalog, cart, orders, analytics)
//! - `client` - Typed storefront client and screen state
//! - `cli` - Migrations, admin bootstrap, catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP clients. The server and the client agree on the
//! wire format by sharing these definitions.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, password policy, statuses and
//!   the response envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
