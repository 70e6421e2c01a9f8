//! Bounded-concurrency fetch engine
//!
//! [`BoundedFetcher`] accepts [`FetchTask`]s, runs each on its own tokio
//! task with at most `workers` in flight, and hands back a [`FetchReport`]
//! from [`ResourceFetcher::wait`] once every accepted task has finished.
//!
//! ```rust,ignore
//! use fetchkit::fetcher::{BoundedFetcher, FetchTask, ResourceFetcher};
//!
//! let fetcher = BoundedFetcher::new(&config.fetcher)?;
//! fetcher.enqueue(FetchTask::new("lsk", url, "naif0012.tls")).await?;
//! let report = fetcher.wait().await;
//! ```

mod bounded;
pub mod http;
mod outstanding;
pub mod report;
pub mod task;

pub use bounded::BoundedFetcher;
pub use http::{HttpClient, HttpConfig};
pub use report::{FetchReport, TaskError, TaskOutcome, TaskStatus};
pub use task::FetchTask;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetcher was cancelled")]
    Cancelled,

    #[error("worker pool is closed")]
    Closed,

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Dispatcher for download tasks
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Wait for a free worker slot, then start `task` in the background
    ///
    /// Returns as soon as the task is launched. Fails without launching
    /// anything if the slot cannot be acquired.
    async fn enqueue(&self, task: FetchTask) -> Result<(), FetchError>;

    /// Block until every enqueued task has finished and return their outcomes
    async fn wait(&self) -> FetchReport;

    /// Stop admitting tasks and abort the ones in flight
    ///
    /// Idempotent. Pending `enqueue` calls fail with [`FetchError::Cancelled`];
    /// a pending `wait` returns once the aborted tasks have released their slots.
    fn cancel(&self);
}
