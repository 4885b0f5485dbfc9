//! HTTP server for the package registry
//!
//! A REST API built on Axum. Every request passes through the auth
//! middleware, which resolves the `Authorization` header to a principal.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod server;

pub use auth::{AuthMiddleware, AuthMode};
pub use errors::{HttpError, HttpResult};
/// Re-export commonly used types
pub use server::{create_router, RegistryServer};
