//! HTTP middleware

pub mod auth;
pub mod logging;

pub use auth::{auth_middleware, AuthenticatedUser, Claims};
pub use logging::logging_middleware;
