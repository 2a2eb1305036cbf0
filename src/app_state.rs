use std::sync::Arc;

use crate::services::{orchestrator::Orchestrator, queue::JobQueue};

/// Shared application state passed to the processing route handlers.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<JobQueue>,
    pub orchestrator: Arc<Orchestrator>,
    pub default_callback_url: Arc<str>,
}

impl AppState {
    pub fn new(queue: JobQueue, orchestrator: Orchestrator, default_callback_url: &str) -> Self {
        Self {
            queue: Arc::new(queue),
            orchestrator: Arc::new(orchestrator),
            default_callback_url: Arc::from(default_callback_url),
        }
    }
}
