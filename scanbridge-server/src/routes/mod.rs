pub mod v1;

use axum::{Router, routing::get};
use scanbridge_core::api::routes::{HEALTH, v1::ROOT};

use crate::{AppState, handlers::health::health};

/// Create the main API router with all versions
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route(HEALTH, get(health))
        .nest(ROOT, v1::create_v1_router())
}
