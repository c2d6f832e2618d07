//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod contests;
pub mod health;
pub mod submissions;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{auth::auth_middleware, logging::logging_middleware},
    state::AppState,
};

/// Create all API routes. Everything except the health check requires a
/// bearer token.
pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/submissions", submissions::routes())
        .nest("/contests", contests::routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(health::routes()).merge(protected)
}

/// Full application router mounted under `/api/v1`
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes(state.clone()))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
