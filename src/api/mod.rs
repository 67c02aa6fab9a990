//! HTTP API for the audit service.
//!
//! Routes are nested under `/api/`. Audit submission is open to anonymous
//! callers; the report read endpoints require a bearer token, and the same
//! token (hashed) is what scopes stored reports to their owner.
//!
//! The router is composable: `audit_api_router()` returns a `Router` that
//! can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::audit_api_router;
pub use server::{start_api_server, AuditApiServer};
pub use types::ApiContext;
