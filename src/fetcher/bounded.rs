use super::http::{HttpClient, HttpConfig};
use super::outstanding::Outstanding;
use super::report::{FetchReport, TaskError, TaskOutcome};
use super::task::FetchTask;
use super::{FetchError, ResourceFetcher};
use crate::config::FetcherConfig;
use crate::humanize::ByteSize;
use crate::observability::{FetchMetrics, MetricsSnapshot};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// Runs downloads with at most `workers` in flight
///
/// Admission and completion are tracked separately: a semaphore with one
/// permit per worker bounds concurrency, and an outstanding-task counter backs
/// [`wait`](ResourceFetcher::wait). Waiting therefore leaves every permit in
/// place and the fetcher can run any number of batches in sequence.
///
/// Outcomes are buffered until the next `wait`, so one fetcher should serve
/// one batch at a time.
pub struct BoundedFetcher {
    workers: usize,
    client: HttpClient,
    semaphore: Arc<Semaphore>,
    outstanding: Arc<Outstanding>,
    outcomes: Arc<Mutex<Vec<TaskOutcome>>>,
    cancel: CancellationToken,
    remove_partial: bool,
    metrics: Arc<FetchMetrics>,
}

impl BoundedFetcher {
    /// Build a fetcher and its HTTP client from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = HttpClient::new(HttpConfig::from(config))
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Self::with_client(config.workers, client, config.remove_partial)
    }

    pub fn with_client(
        workers: usize,
        client: HttpClient,
        remove_partial: bool,
    ) -> Result<Self, FetchError> {
        if workers == 0 {
            return Err(FetchError::NoWorkers);
        }

        info!(workers, write_buffer = %ByteSize(client.config().write_buffer as u64), "Creating bounded fetcher");

        Ok(Self {
            workers,
            client,
            semaphore: Arc::new(Semaphore::new(workers)),
            outstanding: Outstanding::new(),
            outcomes: Arc::new(Mutex::new(Vec::new())),
            cancel: CancellationToken::new(),
            remove_partial,
            metrics: Arc::new(FetchMetrics::new()),
        })
    }

    /// Slots currently held by running tasks
    pub fn in_flight(&self) -> usize {
        self.workers - self.semaphore.available_permits()
    }

    /// Tasks spawned and not yet finished
    pub fn outstanding(&self) -> usize {
        self.outstanding.count()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl ResourceFetcher for BoundedFetcher {
    async fn enqueue(&self, task: FetchTask) -> Result<(), FetchError> {
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        // Backpressure: suspend here until a worker slot frees up.
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(name = %task.name, "Cancelled while waiting for a worker slot");
                return Err(FetchError::Cancelled);
            }
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                permit.map_err(|_| FetchError::Closed)?
            }
        };

        let tracked = self.outstanding.track();
        let client = self.client.clone();
        let cancel = self.cancel.clone();
        let outcomes = Arc::clone(&self.outcomes);
        let metrics = Arc::clone(&self.metrics);
        let remove_partial = self.remove_partial;
        let span = info_span!("fetch", name = %task.name);

        debug!(name = %task.name, in_flight = self.in_flight(), "Task admitted");

        tokio::spawn(
            async move {
                let _tracked = tracked;
                let outcome = run_task(&client, task, &cancel, remove_partial, &metrics).await;
                outcomes.lock().await.push(outcome);
                // Free the slot before the task stops counting as outstanding.
                drop(permit);
            }
            .instrument(span),
        );

        Ok(())
    }

    async fn wait(&self) -> FetchReport {
        self.outstanding.idle().await;
        let outcomes = std::mem::take(&mut *self.outcomes.lock().await);
        FetchReport::new(outcomes)
    }

    fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!(outstanding = self.outstanding(), "Cancelling fetcher");
        }
        self.cancel.cancel();
    }
}

async fn run_task(
    client: &HttpClient,
    task: FetchTask,
    cancel: &CancellationToken,
    remove_partial: bool,
    metrics: &FetchMetrics,
) -> TaskOutcome {
    let started = Instant::now();
    metrics.task_started();

    let result = client.download_to(&task.url, &task.destination, cancel).await;

    match &result {
        Ok(bytes) => {
            metrics.task_succeeded(*bytes);
            info!(
                url = %task.url,
                path = %task.destination.display(),
                size = %ByteSize(*bytes),
                "Resource downloaded"
            );
        }
        Err(error) => {
            metrics.task_failed();
            warn!(url = %task.url, path = %task.destination.display(), %error, "Resource fetch failed");

            let file_created = !matches!(error, TaskError::CreateFile { .. });
            if remove_partial && file_created {
                remove_partial_file(&task).await;
            }
        }
    }

    TaskOutcome::new(task.name, task.url, task.destination, result, started.elapsed())
}

async fn remove_partial_file(task: &FetchTask) {
    match tokio::fs::remove_file(&task.destination).await {
        Ok(()) => debug!(path = %task.destination.display(), "Removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %task.destination.display(),
            error = %e,
            "Failed to remove partial file"
        ),
    }
}
