use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use faceswap_relay::{
    app_state::AppState,
    config::AppConfig,
    routes,
    services::{
        callback::CallbackClient,
        generation::{token_source, ImagenClient},
        orchestrator::{Orchestrator, OrchestratorSettings},
        queue::JobQueue,
        vision::RemoteFaceSwapper,
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing faceswap processing API");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("faceswap_jobs_submitted_total", "Jobs accepted for processing");
    metrics::describe_counter!("faceswap_jobs_succeeded_total", "Jobs that produced a swapped image");
    metrics::describe_counter!("faceswap_jobs_failed_total", "Jobs that ended with a failed result");
    metrics::describe_counter!(
        "faceswap_callbacks_failed_total",
        "Callback deliveries that did not reach a 2xx response"
    );
    metrics::describe_histogram!(
        "faceswap_job_duration_seconds",
        "Time from dispatch to result, excluding callback delivery"
    );
    metrics::describe_gauge!("faceswap_jobs_in_flight", "Jobs currently being executed");
    metrics::describe_gauge!("faceswap_queue_depth", "Jobs waiting for a worker");

    // Collaborator clients connect lazily on first use
    let vision = RemoteFaceSwapper::new(
        config.vision_service_url.clone(),
        config.vision_face_selection,
        config.vision_timeout(),
    );
    let generation_url = config.generation_url();
    if generation_url.is_none() {
        tracing::warn!("GENERATION_PROJECT/GENERATION_ENDPOINT not set, test image jobs will fail");
    } else if config.generation_api_token.is_none() {
        tracing::info!("GENERATION_API_TOKEN not set, using application default credentials");
    }
    let generator = ImagenClient::new(
        generation_url,
        token_source(config.generation_api_token.clone()),
        config.generation_timeout(),
    );

    let callbacks =
        CallbackClient::new(config.callback_timeout()).expect("Failed to build callback HTTP client");

    let orchestrator = Orchestrator::new(
        Arc::new(vision),
        Arc::new(generator),
        callbacks,
        OrchestratorSettings::from_config(&config),
    );

    let (queue, dispatcher) = JobQueue::start(orchestrator.clone(), config.worker_concurrency);

    let state = AppState::new(queue, orchestrator, &config.callback_api_url);

    let app = routes::processing_router(state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes));

    let bind_addr = config.bind_addr();
    tracing::info!(
        callback_url = %config.callback_api_url,
        workers = config.worker_concurrency,
        "Starting faceswap processing API on {}",
        bind_addr
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    // Consumes the router, so the last queue handle is gone once serving stops
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("HTTP server stopped, waiting for accepted jobs to deliver their callbacks");
    if let Err(e) = dispatcher.await {
        tracing::error!(error = %e, "Job dispatcher ended abnormally");
    }
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
