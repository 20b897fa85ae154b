pub mod health;
pub mod sessions;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route(
            "/api/v1/sessions",
            get(sessions::handle_list_sessions).post(sessions::handle_create_session),
        )
        .route(
            "/api/v1/sessions/resumable",
            get(sessions::handle_resumable_sessions),
        )
        .route("/api/v1/sessions/:id", get(sessions::handle_get_session))
        .route(
            "/api/v1/sessions/:id/messages",
            post(sessions::handle_post_message),
        )
        .route(
            "/api/v1/sessions/:id/pause",
            post(sessions::handle_pause_session),
        )
        .route(
            "/api/v1/sessions/:id/resume",
            post(sessions::handle_resume_session),
        )
        .with_state(state)
}
