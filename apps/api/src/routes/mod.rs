pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_mb * 1024 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        // Screening API
        .route("/api/v1/screen", post(handlers::handle_screen))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
