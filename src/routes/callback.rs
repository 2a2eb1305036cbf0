use axum::Json;

use crate::models::result::{CallbackAck, JobResult, ResultStatus};

/// Receives a job result. Stateless: the payload is logged and echoed back
/// without checking it against any known job.
pub async fn receive_callback(Json(result): Json<JobResult>) -> Json<CallbackAck> {
    tracing::info!(
        request_id = ?result.request_id,
        status = %result.status,
        "Callback received"
    );

    match result.status {
        ResultStatus::Success => tracing::info!(
            request_id = ?result.request_id,
            generated = result.generated_image_base64.is_some(),
            "Face swap completed successfully"
        ),
        ResultStatus::Failed => tracing::warn!(
            request_id = ?result.request_id,
            error = result.error.as_deref().unwrap_or_default(),
            "Job reported failure"
        ),
        ResultStatus::Processing => {}
    }

    Json(CallbackAck::from(result))
}
