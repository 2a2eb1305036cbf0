use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gcp_auth::TokenProvider;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::models::request::TestAttributes;
use crate::services::imaging::{self, ImageError};

const PROMPT_PREFIX: &str = concat!(
    "Draw a realistic image for this test. Do not add text. ",
    "It should represent the test result. It should look like a stock image. ",
    "Only 1 person should be in the image"
);

/// Text-to-image capability.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, attributes: &TestAttributes) -> Result<Vec<u8>, GenerationError>;
}

/// Build the natural-language prompt for a set of test attributes.
pub fn build_prompt(attributes: &TestAttributes) -> String {
    let details = serde_json::json!({
        "image_place": attributes.image_place,
        "image_style": attributes.image_style,
        "test_sonucu": attributes.test_sonucu,
        "test_adı": attributes.test_adi,
        "test_aciklamasi": attributes.test_aciklamasi,
        "gender": attributes.gender,
        "age": attributes.age,
    });
    format!("{PROMPT_PREFIX} {details}")
}

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Source of the bearer token sent with each predict request.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, GenerationError>;
}

/// A fixed token, used as given on every request.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, GenerationError> {
        Ok(self.0.clone())
    }
}

/// Google application default credentials. The provider is discovered on
/// first use and caches tokens, fetching a new one when the current one
/// is about to expire.
#[derive(Default)]
pub struct ApplicationDefaultCredentials {
    provider: OnceCell<Arc<dyn TokenProvider>>,
}

impl ApplicationDefaultCredentials {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessTokenSource for ApplicationDefaultCredentials {
    async fn access_token(&self) -> Result<String, GenerationError> {
        let provider = self
            .provider
            .get_or_try_init(|| async {
                tracing::info!("Discovering Google application default credentials");
                gcp_auth::provider().await
            })
            .await?;
        let token = provider.token(&[CLOUD_PLATFORM_SCOPE]).await?;
        Ok(token.as_str().to_string())
    }
}

/// Token source for a configured static token, falling back to application
/// default credentials.
pub fn token_source(api_token: Option<String>) -> Arc<dyn AccessTokenSource> {
    match api_token {
        Some(token) => Arc::new(StaticToken(token)),
        None => Arc::new(ApplicationDefaultCredentials::new()),
    }
}

/// Client for the Imagen `:predict` REST endpoint.
pub struct ImagenClient {
    endpoint: Option<String>,
    auth: Arc<dyn AccessTokenSource>,
    timeout: Duration,
    http: OnceCell<Client>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: &'static str,
    negative_prompt: &'static str,
    person_generation: &'static str,
    safety_setting: &'static str,
    add_watermark: bool,
}

impl Default for PredictParameters {
    fn default() -> Self {
        Self {
            sample_count: 1,
            aspect_ratio: "16:9",
            negative_prompt: "",
            person_generation: "allow_all",
            safety_setting: "block_few",
            add_watermark: true,
        }
    }
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

impl ImagenClient {
    /// `endpoint` is the full predict URL; `None` leaves generation unconfigured
    /// and every request fails with [`GenerationError::NotConfigured`].
    pub fn new(endpoint: Option<String>, auth: Arc<dyn AccessTokenSource>, timeout: Duration) -> Self {
        Self {
            endpoint,
            auth,
            timeout,
            http: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client, GenerationError> {
        self.http
            .get_or_try_init(|| async move {
                tracing::info!("Initializing image generation client");
                Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(GenerationError::Http)
            })
            .await
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate(&self, attributes: &TestAttributes) -> Result<Vec<u8>, GenerationError> {
        let endpoint = self.endpoint.as_deref().ok_or(GenerationError::NotConfigured)?;

        let request_body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: build_prompt(attributes),
            }],
            parameters: PredictParameters::default(),
        };

        let token = self.auth.access_token().await?;
        let response = self
            .client()
            .await?
            .post(endpoint)
            .bearer_auth(token)
            .json(&request_body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let predict: PredictResponse = response.json().await?;
        let encoded = predict
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(imaging::decode_base64_image(&encoded)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("image generation is not configured")]
    NotConfigured,

    #[error("image generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image generation credentials unavailable: {0}")]
    Auth(#[from] gcp_auth::Error),

    #[error("image generation service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("image generation service returned no image")]
    EmptyResponse,

    #[error("image generation service returned an invalid image: {0}")]
    Payload(#[from] ImageError),
}
