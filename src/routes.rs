use crate::state::ClassboardState;
use axum::{
    Router,
    routing::{get, post},
};
use dashboard::{get_dashboard, internal_get_students_table, internal_post_students_table_retry};
use students_api::{api_method_not_allowed, get_students};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub mod dashboard;
pub mod students_api;

pub fn build_router(state: ClassboardState) -> Router {
    Router::new()
        .route("/", get(get_dashboard))
        .route(
            "/api/students",
            get(get_students).fallback(api_method_not_allowed),
        )
        .route("/internal/students_table", get(internal_get_students_table))
        .route(
            "/internal/students_table/retry",
            post(internal_post_students_table_retry),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
