//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    accuracy_handler, delete_document_handler, exercise_handler, get_document_handler,
    health_handler, history_handler, profile_handler, progress_handler, put_document_handler,
    root_handler, stats_handler, streak_handler, submit_attempt_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, the mobile app calls from its own origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route(
            "/documents/*path",
            get(get_document_handler)
                .put(put_document_handler)
                .delete(delete_document_handler),
        )
        .route("/exercises/pitch", get(exercise_handler))
        .route(
            "/users/:user_id/attempts",
            post(submit_attempt_handler).get(history_handler),
        )
        .route("/users/:user_id/profile", get(profile_handler))
        .route("/users/:user_id/progress", get(progress_handler))
        .route("/users/:user_id/streak", get(streak_handler))
        .route("/users/:user_id/accuracy", get(accuracy_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
