use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::request::{FaceSwapRequest, TestAttributes, TestImageRequest};

/// Kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    FaceSwapOnly,
    GenerateThenSwap,
}

/// Kind-specific job payload. Images stay base64-encoded until a worker
/// picks the job up; decoding failures are reported through the callback.
#[derive(Debug, Clone)]
pub enum JobInput {
    FaceSwap {
        source_image: String,
        target_image: String,
    },
    GenerateThenSwap {
        attributes: TestAttributes,
        source_face_image: String,
    },
}

/// One asynchronous unit of work.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub input: JobInput,
    pub callback_url: String,
    pub received_at: DateTime<Utc>,
}

impl Job {
    pub fn face_swap(request: FaceSwapRequest, default_callback_url: &str) -> Self {
        Self::new(
            JobInput::FaceSwap {
                source_image: request.source_image_base64,
                target_image: request.target_image_base64,
            },
            request.callback_url,
            default_callback_url,
        )
    }

    pub fn generate_then_swap(request: TestImageRequest, default_callback_url: &str) -> Self {
        Self::new(
            JobInput::GenerateThenSwap {
                attributes: request.attributes,
                source_face_image: request.source_face_image_base64,
            },
            request.callback_url,
            default_callback_url,
        )
    }

    fn new(input: JobInput, callback_url: Option<String>, default_callback_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            callback_url: callback_url.unwrap_or_else(|| default_callback_url.to_string()),
            received_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self.input {
            JobInput::FaceSwap { .. } => JobKind::FaceSwapOnly,
            JobInput::GenerateThenSwap { .. } => JobKind::GenerateThenSwap,
        }
    }
}

/// Lifecycle stage of a job. Only visible through logs and the final callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobStage {
    Received,
    Dispatched,
    Generating,
    Swapping,
    Succeeded,
    Failed,
    CallbackSent,
    CallbackDeliveryFailed,
}

impl JobStage {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: JobStage) -> bool {
        use JobStage::*;
        matches!(
            (self, next),
            (Received, Dispatched)
                | (Dispatched, Generating | Swapping | Failed)
                | (Generating, Swapping | Failed)
                | (Swapping, Succeeded | Failed)
                | (Succeeded | Failed, CallbackSent | CallbackDeliveryFailed)
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, JobStage::CallbackSent | JobStage::CallbackDeliveryFailed)
    }
}
