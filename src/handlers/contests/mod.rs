//! Contest submission handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{routing::post, Router};

use crate::state::AppState;

/// Contest routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/submissions", post(handler::create_contest_submission))
        .route("/{id}/choice-submissions", post(handler::create_contest_choice_submission))
}
