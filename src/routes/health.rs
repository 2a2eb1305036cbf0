use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

fn healthy(service: &str) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: service.to_string(),
    })
}

/// GET /health: liveness of the processing API.
pub async fn health_check() -> Json<HealthResponse> {
    healthy("faceswap-processing-api")
}

/// GET /health: liveness of the callback receiver.
pub async fn receiver_health() -> Json<HealthResponse> {
    healthy("faceswap-callback-api")
}
