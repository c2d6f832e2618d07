//! Submission handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Submission routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create_submission))
        .route("/choice", post(handler::create_choice_submission))
        .route("/{id}", get(handler::get_submission))
        .route("/{id}/refresh", get(handler::refresh_submission))
}
