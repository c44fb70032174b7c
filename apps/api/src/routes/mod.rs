pub mod actions;
pub mod health;
pub mod sessions;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/current",
            get(sessions::handle_current_session),
        )
        .route(
            "/api/v1/sessions/:id/activity",
            post(sessions::handle_activity),
        )
        .route(
            "/api/v1/sessions/:id/security",
            get(sessions::handle_security),
        )
        .route("/api/v1/sessions/:id", delete(sessions::handle_invalidate))
        // Guarded actions
        .route("/api/v1/uploads", post(actions::handle_upload))
        .route("/api/v1/analyze", post(actions::handle_analyze))
        .route("/api/v1/edits", post(actions::handle_edit))
        .route("/api/v1/downloads/*key", get(actions::handle_download))
        .with_state(state)
}
