use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::job::{Job, JobInput, JobKind, JobStage};
use crate::models::request::TestAttributes;
use crate::models::result::JobResult;
use crate::services::{
    callback::CallbackClient,
    generation::{GenerationError, ImageGenerator},
    imaging::{self, ImageError},
    vision::{FaceSwapper, ImageRole, VisionError},
};

/// Timing knobs for job execution.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub vision_timeout: Duration,
    pub generation_timeout: Duration,
    pub processing_delay: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vision_timeout: config.vision_timeout(),
            generation_timeout: config.generation_timeout(),
            processing_delay: Duration::from_millis(config.processing_delay_ms),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            vision_timeout: Duration::from_secs(120),
            generation_timeout: Duration::from_secs(120),
            processing_delay: Duration::ZERO,
        }
    }
}

/// Executes jobs against the collaborators and reports each result to the
/// job's callback address. Cheap to clone; all handles are shared.
#[derive(Clone)]
pub struct Orchestrator {
    vision: Arc<dyn FaceSwapper>,
    generator: Arc<dyn ImageGenerator>,
    callbacks: CallbackClient,
    settings: OrchestratorSettings,
}

/// How the single callback attempt for a job went.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent(StatusCode),
    Failed(String),
}

/// Everything a finished job produced.
#[derive(Debug)]
pub struct JobOutcome {
    pub result: JobResult,
    pub delivery: Delivery,
    pub stages: Vec<JobStage>,
}

struct EncodedImages {
    swapped: String,
    generated: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("{role} image could not be decoded: {source}")]
    Decode {
        role: ImageRole,
        #[source]
        source: ImageError,
    },

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{collaborator} did not respond within {after:?}")]
    Timeout {
        collaborator: &'static str,
        after: Duration,
    },

    #[error("produced image is invalid: {0}")]
    Output(#[source] ImageError),

    #[error("job execution aborted: {0}")]
    Aborted(String),
}

/// Records and logs the stage transitions of one job.
#[derive(Debug, Clone)]
struct StageTracker {
    request_id: Uuid,
    kind: JobKind,
    current: JobStage,
    history: Vec<JobStage>,
}

impl StageTracker {
    fn new(request_id: Uuid, kind: JobKind) -> Self {
        Self {
            request_id,
            kind,
            current: JobStage::Received,
            history: vec![JobStage::Received],
        }
    }

    fn advance(&mut self, next: JobStage) {
        if !self.current.can_advance_to(next) {
            tracing::warn!(
                request_id = %self.request_id,
                from = %self.current,
                to = %next,
                "Unexpected job stage transition"
            );
        }
        self.current = next;
        self.history.push(next);
        tracing::info!(
            request_id = %self.request_id,
            kind = %self.kind,
            stage = %next,
            "Job stage changed"
        );
    }
}

impl Orchestrator {
    pub fn new(
        vision: Arc<dyn FaceSwapper>,
        generator: Arc<dyn ImageGenerator>,
        callbacks: CallbackClient,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            vision,
            generator,
            callbacks,
            settings,
        }
    }

    /// Run a job to completion and deliver its result. Never fails: every
    /// error ends up in the result or the delivery outcome.
    pub async fn run(&self, job: Job) -> JobOutcome {
        let started = Instant::now();
        let request_id = job.id;
        let kind = job.kind();
        let callback_url = job.callback_url.clone();

        let mut tracker = StageTracker::new(request_id, kind);
        tracker.advance(JobStage::Dispatched);

        if !self.settings.processing_delay.is_zero() {
            tracing::debug!(
                request_id = %request_id,
                delay_ms = self.settings.processing_delay.as_millis() as u64,
                "Delaying job processing"
            );
            sleep(self.settings.processing_delay).await;
        }

        let (mut tracker, outcome) = self.execute_isolated(job, tracker).await;

        let result = match outcome {
            Ok(images) => {
                tracker.advance(JobStage::Succeeded);
                metrics::counter!("faceswap_jobs_succeeded_total", "kind" => kind.to_string()).increment(1);
                JobResult::success(request_id, images.swapped, images.generated)
            }
            Err(e) => {
                tracker.advance(JobStage::Failed);
                metrics::counter!("faceswap_jobs_failed_total", "kind" => kind.to_string()).increment(1);
                tracing::warn!(request_id = %request_id, error = %e, "Job failed");
                JobResult::failed(request_id, e.to_string())
            }
        };

        metrics::histogram!("faceswap_job_duration_seconds").record(started.elapsed().as_secs_f64());

        let delivery = self.deliver(&callback_url, &result, &mut tracker).await;

        JobOutcome {
            result,
            delivery,
            stages: tracker.history,
        }
    }

    /// Synchronous face swap used by the direct endpoint; returns the
    /// base64-encoded swapped image.
    pub async fn swap_now(&self, source_b64: &str, target_b64: &str) -> Result<String, JobError> {
        let source = decode_input(source_b64, ImageRole::Source)?;
        let target = decode_input(target_b64, ImageRole::Target)?;
        let swapped = self.swap(&source, &target).await?;
        imaging::encode_image_payload(&swapped).map_err(JobError::Output)
    }

    /// Runs the collaborator steps on their own task so a panic inside a
    /// collaborator still yields a failed result.
    async fn execute_isolated(
        &self,
        job: Job,
        tracker: StageTracker,
    ) -> (StageTracker, Result<EncodedImages, JobError>) {
        let fallback = tracker.clone();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut tracker = tracker;
            let outcome = this.execute(&job, &mut tracker).await;
            (tracker, outcome)
        });

        match handle.await {
            Ok(done) => done,
            Err(e) => (fallback, Err(JobError::Aborted(e.to_string()))),
        }
    }

    async fn execute(
        &self,
        job: &Job,
        tracker: &mut StageTracker,
    ) -> Result<EncodedImages, JobError> {
        match &job.input {
            JobInput::FaceSwap {
                source_image,
                target_image,
            } => {
                let source = decode_input(source_image, ImageRole::Source)?;
                let target = decode_input(target_image, ImageRole::Target)?;

                tracker.advance(JobStage::Swapping);
                let swapped = self.swap(&source, &target).await?;
                tracing::info!(request_id = %job.id, "Face swap completed");

                Ok(EncodedImages {
                    swapped: imaging::encode_image_payload(&swapped).map_err(JobError::Output)?,
                    generated: None,
                })
            }
            JobInput::GenerateThenSwap {
                attributes,
                source_face_image,
            } => {
                let source = decode_input(source_face_image, ImageRole::Source)?;

                tracker.advance(JobStage::Generating);
                let generated = self.generate(attributes).await?;
                tracing::info!(request_id = %job.id, bytes = generated.len(), "Image generation completed");

                tracker.advance(JobStage::Swapping);
                let swapped = self.swap(&source, &generated).await?;
                tracing::info!(request_id = %job.id, "Face swap completed");

                Ok(EncodedImages {
                    swapped: imaging::encode_image_payload(&swapped).map_err(JobError::Output)?,
                    generated: Some(
                        imaging::encode_image_payload(&generated).map_err(JobError::Output)?,
                    ),
                })
            }
        }
    }

    async fn swap(&self, source: &[u8], target: &[u8]) -> Result<Vec<u8>, JobError> {
        let after = self.settings.vision_timeout;
        let swapped = timeout(after, self.vision.swap(source, target))
            .await
            .map_err(|_| JobError::Timeout {
                collaborator: "vision service",
                after,
            })??;
        Ok(swapped)
    }

    async fn generate(&self, attributes: &TestAttributes) -> Result<Vec<u8>, JobError> {
        let after = self.settings.generation_timeout;
        let generated = timeout(after, self.generator.generate(attributes))
            .await
            .map_err(|_| JobError::Timeout {
                collaborator: "image generation service",
                after,
            })??;
        Ok(generated)
    }

    async fn deliver(&self, url: &str, result: &JobResult, tracker: &mut StageTracker) -> Delivery {
        tracing::info!(
            request_id = %tracker.request_id,
            callback_url = %url,
            status = %result.status,
            "Sending callback"
        );

        match self.callbacks.deliver(url, result).await {
            Ok(status) => {
                tracker.advance(JobStage::CallbackSent);
                tracing::info!(
                    request_id = %tracker.request_id,
                    callback_url = %url,
                    http_status = status.as_u16(),
                    "Callback delivered"
                );
                Delivery::Sent(status)
            }
            Err(e) => {
                tracker.advance(JobStage::CallbackDeliveryFailed);
                metrics::counter!("faceswap_callbacks_failed_total").increment(1);
                tracing::error!(
                    request_id = %tracker.request_id,
                    callback_url = %url,
                    error = %e,
                    "Callback delivery failed"
                );
                Delivery::Failed(e.to_string())
            }
        }
    }
}

fn decode_input(payload: &str, role: ImageRole) -> Result<Vec<u8>, JobError> {
    imaging::decode_image_payload(payload).map_err(|source| JobError::Decode { role, source })
}
