use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Status carried by a callback payload. `Processing` is accepted on the
/// wire but never produced by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
    Processing,
}

/// Terminal outcome of a job, POSTed to the callback address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub status: ResultStatus,

    #[serde(default)]
    pub request_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swapped_image_base64: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image_base64: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(request_id: Uuid, swapped: String, generated: Option<String>) -> Self {
        Self {
            status: ResultStatus::Success,
            request_id: Some(request_id),
            swapped_image_base64: Some(swapped),
            generated_image_base64: generated,
            error: None,
        }
    }

    pub fn failed(request_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Failed,
            request_id: Some(request_id),
            swapped_image_base64: None,
            generated_image_base64: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Acknowledgement returned by the callback receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackAck {
    pub message: String,
    pub status: ResultStatus,
    pub request_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swapped_image_base64: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image_base64: Option<String>,
}

impl From<JobResult> for CallbackAck {
    fn from(result: JobResult) -> Self {
        let mut ack = CallbackAck {
            message: "Callback received".to_string(),
            status: result.status,
            request_id: result.request_id,
            error: None,
            swapped_image_base64: None,
            generated_image_base64: None,
        };

        match result.status {
            ResultStatus::Success => {
                // Images are echoed only when the swap actually produced one.
                if result.swapped_image_base64.as_deref().is_some_and(|s| !s.is_empty()) {
                    ack.swapped_image_base64 = result.swapped_image_base64;
                    ack.generated_image_base64 = result.generated_image_base64;
                }
            }
            ResultStatus::Failed => ack.error = result.error,
            ResultStatus::Processing => {}
        }

        ack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_result_carries_no_images() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(JobResult::failed(id, "no face detected in target image")).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "failed",
                "request_id": id.to_string(),
                "error": "no face detected in target image"
            })
        );
    }

    #[test]
    fn generated_image_only_serialized_when_present() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(JobResult::success(id, "c3dhcA==".into(), None)).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["swapped_image_base64"], "c3dhcA==");
        assert!(value.get("generated_image_base64").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn legacy_payload_with_empty_image_is_accepted() {
        let result: JobResult = serde_json::from_value(json!({
            "status": "success",
            "swapped_image_base64": ""
        }))
        .unwrap();
        assert_eq!(result.request_id, None);

        let ack = CallbackAck::from(result);
        assert_eq!(ack.status, ResultStatus::Success);
        assert!(ack.swapped_image_base64.is_none());
    }

    #[test]
    fn ack_echoes_error_for_failures() {
        let id = Uuid::new_v4();
        let ack = CallbackAck::from(JobResult::failed(id, "boom"));
        assert_eq!(ack.error.as_deref(), Some("boom"));
        assert_eq!(ack.request_id, Some(id));
        assert!(ack.swapped_image_base64.is_none());
    }

    #[test]
    fn processing_status_round_trips_but_is_reserved() {
        let result: JobResult = serde_json::from_value(json!({"status": "processing"})).unwrap();
        let ack = CallbackAck::from(result);
        assert_eq!(ack.status, ResultStatus::Processing);
        assert!(ack.error.is_none());
    }
}
