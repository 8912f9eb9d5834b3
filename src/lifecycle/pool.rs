//! Supervised background workers sharing one shutdown signal.

use std::future::Future;

use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::lifecycle::shutdown::Shutdown;

/// A set of long-running workers stopped together.
pub struct WorkerPool {
    shutdown: Shutdown,
    workers: JoinSet<()>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            shutdown: Shutdown::new(),
            workers: JoinSet::new(),
        }
    }

    /// Spawn a worker. It receives the shutdown signal and must return once it fires.
    pub fn go<F, Fut>(&mut self, worker: F)
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stop = self.shutdown.subscribe();
        self.workers.spawn(worker(stop));
    }

    /// Number of workers not yet joined.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Signal every worker and wait for all of them to finish.
    pub async fn stop(mut self) {
        tracing::info!(workers = self.workers.len(), "Stopping worker pool");
        self.shutdown.trigger();

        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker terminated abnormally");
            }
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
