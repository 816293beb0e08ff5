//! HTTP surface through which the external scan pipeline reports back.
//!
//! Build a state with [`infra::startup::wire_app_state`] and serve the router
//! returned by [`create_app`].

pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::trace::TraceLayer;

pub use infra::app_state::AppState;

/// Full application router with state, request tracing and the upload
/// body limit applied.
pub fn create_app(state: AppState) -> Router {
    let body_limit = match state.publish().max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    routes::create_api_router()
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
