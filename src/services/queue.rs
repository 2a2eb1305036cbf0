use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use crate::models::job::Job;
use crate::services::orchestrator::Orchestrator;

/// Submission side of the in-process job queue. Accepting a job never waits
/// and never fails while the dispatcher is alive; the worker pool bounds how
/// many jobs execute at once, not how many may wait.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    /// Create the queue and spawn the dispatcher that drains it, running at
    /// most `concurrency` jobs at once.
    ///
    /// The returned handle completes once every `JobQueue` clone has been
    /// dropped and every accepted job has delivered its callback.
    pub fn start(orchestrator: Orchestrator, concurrency: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let dispatcher = tokio::spawn(dispatch(receiver, orchestrator, concurrency.max(1)));
        (Self { sender }, dispatcher)
    }

    /// Hand a job to the dispatcher without waiting for it to run.
    pub fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        self.sender.send(job).map_err(|_| QueueError::Closed)?;
        metrics::gauge!("faceswap_queue_depth").increment(1.0);
        Ok(())
    }
}

async fn dispatch(
    mut receiver: mpsc::UnboundedReceiver<Job>,
    orchestrator: Orchestrator,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut workers = JoinSet::new();
    tracing::info!(concurrency, "Job dispatcher started");

    while let Some(job) = receiver.recv().await {
        metrics::gauge!("faceswap_queue_depth").decrement(1.0);
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };

        while let Some(finished) = workers.try_join_next() {
            log_worker_exit(finished);
        }

        let orchestrator = orchestrator.clone();
        workers.spawn(async move {
            metrics::gauge!("faceswap_jobs_in_flight").increment(1.0);
            let outcome = orchestrator.run(job).await;
            metrics::gauge!("faceswap_jobs_in_flight").decrement(1.0);
            tracing::debug!(
                request_id = ?outcome.result.request_id,
                status = %outcome.result.status,
                "Worker finished job"
            );
            drop(permit);
        });
    }

    tracing::info!(in_flight = workers.len(), "Job queue closed, draining workers");
    while let Some(finished) = workers.join_next().await {
        log_worker_exit(finished);
    }
    tracing::info!("Job dispatcher stopped");
}

fn log_worker_exit(finished: Result<(), tokio::task::JoinError>) {
    if let Err(e) = finished {
        tracing::error!(error = %e, "Worker task ended abnormally");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,
}
