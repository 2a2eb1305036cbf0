#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::OnceCell;

use crate::services::imaging::{self, ImageError};

/// Which face to use when an image contains more than one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FaceSelection {
    /// First face in detector order.
    #[default]
    First,
    /// Face with the largest bounding box.
    Largest,
}

/// Which of the two swap inputs an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ImageRole {
    Source,
    Target,
}

/// Face detection + swap capability.
#[async_trait]
pub trait FaceSwapper: Send + Sync {
    /// Place the face found in `source` onto the face found in `target`,
    /// returning the encoded result image.
    async fn swap(&self, source: &[u8], target: &[u8]) -> Result<Vec<u8>, VisionError>;
}

/// Client for a face swap inference service.
///
/// The service accepts `{source_image_base64, target_image_base64,
/// face_selection}` and answers with `{swapped_image_base64}`, or with a 422
/// carrying `{error, message}` where `error` is one of `no_face_source`,
/// `no_face_target`, `decode_source`, `decode_target`.
pub struct RemoteFaceSwapper {
    endpoint: String,
    selection: FaceSelection,
    timeout: Duration,
    http: OnceCell<Client>,
    #[cfg(test)]
    initializations: AtomicUsize,
}

#[derive(Serialize)]
struct SwapRequest<'a> {
    source_image_base64: &'a str,
    target_image_base64: &'a str,
    face_selection: FaceSelection,
}

#[derive(Deserialize)]
struct SwapResponse {
    swapped_image_base64: String,
}

#[derive(Deserialize)]
struct SwapErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

impl RemoteFaceSwapper {
    pub fn new(endpoint: impl Into<String>, selection: FaceSelection, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            selection,
            timeout,
            http: OnceCell::new(),
            #[cfg(test)]
            initializations: AtomicUsize::new(0),
        }
    }

    /// HTTP client, built on first use only.
    async fn client(&self) -> Result<&Client, VisionError> {
        self.http
            .get_or_try_init(|| async move {
                tracing::info!(endpoint = %self.endpoint, selection = %self.selection, "Initializing vision service client");
                #[cfg(test)]
                self.initializations.fetch_add(1, Ordering::SeqCst);
                Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| VisionError::Init(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl FaceSwapper for RemoteFaceSwapper {
    async fn swap(&self, source: &[u8], target: &[u8]) -> Result<Vec<u8>, VisionError> {
        imaging::sniff_format(source).map_err(|_| VisionError::Decode(ImageRole::Source))?;
        imaging::sniff_format(target).map_err(|_| VisionError::Decode(ImageRole::Target))?;
        let source_b64 = imaging::encode_base64(source);
        let target_b64 = imaging::encode_base64(target);

        let response = self
            .client()
            .await?
            .post(&self.endpoint)
            .json(&SwapRequest {
                source_image_base64: &source_b64,
                target_image_base64: &target_b64,
                face_selection: self.selection,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body: SwapErrorBody = response.json().await?;
            return Err(VisionError::from_service_code(&body.error, body.message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VisionError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: SwapResponse = response.json().await?;
        Ok(imaging::decode_base64_image(&body.swapped_image_base64)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("no face detected in {0} image")]
    NoFaceDetected(ImageRole),

    #[error("{0} image could not be decoded")]
    Decode(ImageRole),

    #[error("vision service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vision service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("vision service returned an invalid image: {0}")]
    Payload(#[from] ImageError),

    #[error("vision service client could not be initialized: {0}")]
    Init(String),
}

impl VisionError {
    fn from_service_code(code: &str, message: String) -> Self {
        match code {
            "no_face_source" => VisionError::NoFaceDetected(ImageRole::Source),
            "no_face_target" => VisionError::NoFaceDetected(ImageRole::Target),
            "decode_source" => VisionError::Decode(ImageRole::Source),
            "decode_target" => VisionError::Decode(ImageRole::Target),
            _ => VisionError::Service { status: 422, message },
        }
    }
}
