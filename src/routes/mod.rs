pub mod callback;
pub mod error;
pub mod health;
pub mod metrics;
pub mod process;

use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

/// Routes served by the processing API.
pub fn processing_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/process", post(process::process_face_swap))
        .route("/process-face-swap", post(process::process_face_swap))
        .route("/process-test-image", post(process::process_test_image))
        .route("/direct-swap", post(process::direct_swap))
        .with_state(state)
}

/// Routes served by the callback receiver. All result paths share one handler;
/// everything but `/callback` is kept for older clients.
pub fn receiver_router() -> Router {
    const RESULT_PATHS: [&str; 6] = [
        "/callback",
        "/callback/face-swap",
        "/callback/test-image",
        "/test",
        "/direct",
        "/face-swap",
    ];

    RESULT_PATHS
        .iter()
        .fold(Router::new(), |router, path| {
            router.route(path, post(callback::receive_callback))
        })
        .route("/health", get(health::receiver_health))
}
