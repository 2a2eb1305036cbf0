use serde::Deserialize;
use std::time::Duration;

use crate::services::vision::FaceSelection;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bind host for the processing API
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the processing API
    #[serde(default = "default_port")]
    pub port: u16,

    /// Callback target used when a request carries no `callback_url`
    #[serde(default = "default_callback_api_url")]
    pub callback_api_url: String,

    /// Timeout applied to every callback delivery
    #[serde(default = "default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,

    /// Face swap inference endpoint
    #[serde(default = "default_vision_service_url")]
    pub vision_service_url: String,

    #[serde(default = "default_collaborator_timeout_secs")]
    pub vision_timeout_secs: u64,

    /// Which face to use when an image contains several
    #[serde(default)]
    pub vision_face_selection: FaceSelection,

    /// Cloud project hosting the image generation model
    pub generation_project: Option<String>,

    #[serde(default = "default_generation_location")]
    pub generation_location: String,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Fixed bearer token for the image generation API. When unset, tokens
    /// come from Google application default credentials and are refreshed
    /// as they expire.
    pub generation_api_token: Option<String>,

    /// Full predict URL; overrides project/location/model when set
    pub generation_endpoint: Option<String>,

    #[serde(default = "default_collaborator_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Number of jobs executed concurrently
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    /// Artificial delay before a dispatched job starts processing
    #[serde(default)]
    pub processing_delay_ms: u64,

    /// Request body limit (images arrive base64-encoded inside JSON)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_callback_api_url() -> String {
    "http://127.0.0.1:8000/callback".to_string()
}

fn default_callback_timeout_secs() -> u64 {
    30
}

fn default_vision_service_url() -> String {
    "http://127.0.0.1:8500/swap".to_string()
}

fn default_collaborator_timeout_secs() -> u64 {
    120
}

fn default_generation_location() -> String {
    "us-central1".to_string()
}

fn default_generation_model() -> String {
    "imagen-4.0-generate-001".to_string()
}

fn default_worker_concurrency() -> usize {
    4
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    pub fn vision_timeout(&self) -> Duration {
        Duration::from_secs(self.vision_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Predict URL for the generation model, if enough is configured to build one.
    pub fn generation_url(&self) -> Option<String> {
        if let Some(endpoint) = &self.generation_endpoint {
            return Some(endpoint.clone());
        }
        let project = self.generation_project.as_ref()?;
        Some(format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{project}/locations/{loc}/publishers/google/models/{model}:predict",
            loc = self.generation_location,
            model = self.generation_model,
        ))
    }
}

/// Configuration for the callback receiver binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_receiver_port")]
    pub port: u16,
}

fn default_receiver_port() -> u16 {
    8000
}

impl ReceiverConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
