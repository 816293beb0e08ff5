use axum::{
    Router,
    routing::{get, post},
};
use scanbridge_core::api::routes::{utils::relative, v1};

use crate::{
    AppState,
    handlers::publish::{
        latest_publish_state, pipeline_summary, publish_event,
        publish_scan_output,
    },
};

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            relative(v1::publish::EVENT),
            get(latest_publish_state).post(publish_event),
        )
        .route(
            relative(v1::publish::SCAN_OUTPUT),
            post(publish_scan_output),
        )
        .route(relative(v1::publish::SUMMARY), get(pipeline_summary))
        // Paths used by existing pipeline workflows
        .route(relative(v1::pipeline_publish::EVENTS), post(publish_event))
        .route(
            relative(v1::pipeline_publish::LATEST),
            get(latest_publish_state),
        )
        .route(
            relative(v1::pipeline_publish::SCAN_OUTPUT),
            post(publish_scan_output),
        )
        .route(
            relative(v1::pipeline_publish::SUMMARY),
            get(pipeline_summary),
        )
}
