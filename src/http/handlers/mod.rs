//! HTTP request handlers

pub mod access;
pub mod auth;
pub mod package;
pub mod status;

// Re-export AppState (used by all handlers)
pub use status::AppState;
