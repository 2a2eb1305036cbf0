//! Fake collaborators and a local callback sink for orchestrator tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use faceswap_relay::app_state::AppState;
use faceswap_relay::models::request::TestAttributes;
use faceswap_relay::models::result::JobResult;
use faceswap_relay::routes;
use faceswap_relay::services::callback::CallbackClient;
use faceswap_relay::services::generation::{GenerationError, ImageGenerator};
use faceswap_relay::services::orchestrator::{Orchestrator, OrchestratorSettings};
use faceswap_relay::services::queue::JobQueue;
use faceswap_relay::services::vision::{FaceSwapper, ImageRole, VisionError};

use crate::fixtures;

/// Vision service stand-in: "detects" a face in any image that is not pure black.
#[derive(Default)]
pub struct FakeSwapper {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub panics: bool,
}

impl FakeSwapper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn panicking() -> Arc<Self> {
        Arc::new(Self {
            panics: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FaceSwapper for FakeSwapper {
    async fn swap(&self, source: &[u8], target: &[u8]) -> Result<Vec<u8>, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panics {
            panic!("vision model crashed");
        }
        if fixtures::dominant_color(source) == fixtures::NO_FACE {
            return Err(VisionError::NoFaceDetected(ImageRole::Source));
        }
        if fixtures::dominant_color(target) == fixtures::NO_FACE {
            return Err(VisionError::NoFaceDetected(ImageRole::Target));
        }
        Ok(fixtures::png(fixtures::SWAPPED))
    }
}

/// Image generation stand-in.
#[derive(Default)]
pub struct FakeGenerator {
    pub calls: AtomicUsize,
    pub fails: bool,
}

impl FakeGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fails: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate(&self, _attributes: &TestAttributes) -> Result<Vec<u8>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(GenerationError::Service {
                status: 503,
                body: "model overloaded".to_string(),
            });
        }
        Ok(fixtures::png(fixtures::GENERATED))
    }
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        vision_timeout: Duration::from_secs(5),
        generation_timeout: Duration::from_secs(5),
        processing_delay: Duration::ZERO,
    }
}

pub fn orchestrator(vision: Arc<FakeSwapper>, generator: Arc<FakeGenerator>) -> Orchestrator {
    orchestrator_with(vision, generator, settings())
}

pub fn orchestrator_with(
    vision: Arc<FakeSwapper>,
    generator: Arc<FakeGenerator>,
    settings: OrchestratorSettings,
) -> Orchestrator {
    let callbacks = CallbackClient::new(Duration::from_secs(2)).expect("callback client");
    Orchestrator::new(vision, generator, callbacks, settings)
}

/// Processing API router backed by a live queue and dispatcher.
pub fn processing_app(orchestrator: Orchestrator, default_callback_url: &str) -> Router {
    processing_app_with_workers(orchestrator, default_callback_url, 4).0
}

/// Like [`processing_app`], with a chosen worker count. The dispatcher
/// handle completes once the router (and its queue) is dropped and every
/// accepted job has finished.
pub fn processing_app_with_workers(
    orchestrator: Orchestrator,
    default_callback_url: &str,
    workers: usize,
) -> (Router, JoinHandle<()>) {
    let (queue, dispatcher) = JobQueue::start(orchestrator.clone(), workers);
    let app = routes::processing_router(AppState::new(queue, orchestrator, default_callback_url));
    (app, dispatcher)
}

/// Local HTTP endpoint collecting every result POSTed to it.
pub struct CallbackSink {
    pub url: String,
    results: mpsc::UnboundedReceiver<JobResult>,
}

async fn collect(
    State(tx): State<mpsc::UnboundedSender<JobResult>>,
    Json(result): Json<JobResult>,
) -> StatusCode {
    let _ = tx.send(result);
    StatusCode::OK
}

impl CallbackSink {
    pub async fn start() -> Self {
        let (tx, results) = mpsc::unbounded_channel();
        let app = Router::new().route("/hook", post(collect)).with_state(tx);
        let url = serve(app).await;
        Self {
            url: format!("{url}/hook"),
            results,
        }
    }

    /// Wait for the next delivered result.
    pub async fn next_result(&mut self) -> JobResult {
        timeout(Duration::from_secs(10), self.results.recv())
            .await
            .expect("no callback received within 10s")
            .expect("callback sink closed")
    }

    /// A result that has already been delivered, without waiting.
    pub fn try_next(&mut self) -> Option<JobResult> {
        self.results.try_recv().ok()
    }

    /// Assert nothing else arrives within `wait`.
    pub async fn assert_idle(&mut self, wait: Duration) {
        if let Ok(Some(extra)) = timeout(wait, self.results.recv()).await {
            panic!("unexpected extra callback: {extra:?}");
        }
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// URL of a port nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/callback")
}
