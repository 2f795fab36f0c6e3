//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `CatchPanicLayer` (panic -> generic envelope)
//! 3. `TraceLayer` (request span)
//! 4. Request ID (add unique ID to each request)
//! 5. `TimeoutLayer` (30 s)
//! 6. CORS

pub mod auth;
pub mod cors;
pub mod extract;
pub mod request_id;

pub use auth::{RequireAdmin, RequireUser, bearer_token};
pub use cors::cors_layer;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
