use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::models::job::Job;
use crate::models::request::{DirectSwapResponse, FaceSwapRequest, SubmitResponse, TestImageRequest};
use crate::routes::error::ApiError;

/// POST /process, /process-face-swap: queue a face swap job.
pub async fn process_face_swap(
    State(state): State<AppState>,
    Json(payload): Json<FaceSwapRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    payload.validate()?;
    let job = Job::face_swap(payload, &state.default_callback_url);
    submit(
        &state,
        job,
        "Request received. Face swap processing will continue in background.",
    )
}

/// POST /process-test-image: queue a generate-then-swap job.
pub async fn process_test_image(
    State(state): State<AppState>,
    Json(payload): Json<TestImageRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    payload.validate()?;
    let job = Job::generate_then_swap(payload, &state.default_callback_url);
    submit(
        &state,
        job,
        "Request received. Image generation and face swap will continue in background.",
    )
}

fn submit(state: &AppState, job: Job, message: &str) -> Result<Json<SubmitResponse>, ApiError> {
    let request_id = job.id;
    let kind = job.kind();

    tracing::info!(
        request_id = %request_id,
        kind = %kind,
        callback_url = %job.callback_url,
        stage = "received",
        "Request received"
    );
    metrics::counter!("faceswap_jobs_submitted_total", "kind" => kind.to_string()).increment(1);

    state.queue.enqueue(job)?;

    tracing::info!(request_id = %request_id, "Job queued, returning immediate response");

    Ok(Json(SubmitResponse {
        message: message.to_string(),
        request_id,
    }))
}

/// POST /direct-swap: run a face swap inline and return the image.
pub async fn direct_swap(
    State(state): State<AppState>,
    Json(payload): Json<FaceSwapRequest>,
) -> Result<Json<DirectSwapResponse>, ApiError> {
    payload.validate()?;

    let response = match state
        .orchestrator
        .swap_now(&payload.source_image_base64, &payload.target_image_base64)
        .await
    {
        Ok(swapped) => DirectSwapResponse {
            status: "success".to_string(),
            swapped_image_base64: Some(swapped),
            error: None,
            message: "Face swap completed successfully".to_string(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Direct face swap failed");
            DirectSwapResponse {
                status: "failed".to_string(),
                swapped_image_base64: None,
                error: Some(e.to_string()),
                message: "Face swap failed".to_string(),
            }
        }
    };

    Ok(Json(response))
}
