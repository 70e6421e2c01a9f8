//! Batch orchestration: resolve names, dispatch, await
//!
//! A batch is all-or-nothing at resolution time. Every name is looked up
//! before anything is enqueued; one unknown name (or, by default, two
//! resources writing the same file) rejects the batch with no network or
//! filesystem activity.

mod outcome;

pub use outcome::{BatchOutcome, Rejection};

use crate::catalog::{CatalogError, ResourceCatalog};
use crate::config::{Config, DuplicatePolicy, OutputConfig};
use crate::fetcher::{BoundedFetcher, FetchError, FetchTask, ResourceFetcher};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to build fetcher: {0}")]
    Fetcher(#[source] FetchError),

    #[error("failed to enqueue resource '{name}' after {enqueued} task(s) started: {source}")]
    Enqueue {
        name: String,
        enqueued: usize,
        #[source]
        source: FetchError,
    },
}

/// Resolves batches of resource names against the catalog and downloads them
pub struct FetchService {
    catalog: Arc<RwLock<ResourceCatalog>>,
    fetcher: Arc<dyn ResourceFetcher>,
    output_dir: PathBuf,
    duplicates: DuplicatePolicy,
    // The fetcher's report covers everything finished since the last wait,
    // so batches run one at a time.
    batch_lock: Mutex<()>,
}

impl FetchService {
    pub fn new(
        catalog: ResourceCatalog,
        fetcher: Arc<dyn ResourceFetcher>,
        output: &OutputConfig,
    ) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            fetcher,
            output_dir: output.dir.clone(),
            duplicates: output.duplicate_destinations,
            batch_lock: Mutex::new(()),
        }
    }

    /// Load the catalog named in `config` and build a [`BoundedFetcher`]
    ///
    /// A missing or malformed catalog is fatal.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let catalog = ResourceCatalog::load(&config.catalog.path)?;
        let fetcher = BoundedFetcher::new(&config.fetcher).map_err(ServiceError::Fetcher)?;
        Ok(Self::new(catalog, Arc::new(fetcher), &config.output))
    }

    /// Shared handle for callers that edit the catalog between batches
    pub fn catalog(&self) -> Arc<RwLock<ResourceCatalog>> {
        Arc::clone(&self.catalog)
    }

    /// Abort the running batch and refuse new work
    pub fn cancel(&self) {
        self.fetcher.cancel();
    }

    /// Download every named resource, or none of them
    ///
    /// Rejections (unknown name, colliding destinations) are logged and
    /// returned as [`BatchOutcome::Rejected`]. If an enqueue fails the batch
    /// stops dispatching and returns without waiting; tasks already started
    /// keep running.
    pub async fn fetch<S: AsRef<str>>(&self, names: &[S]) -> Result<BatchOutcome, ServiceError> {
        let _batch = self.batch_lock.lock().await;
        let batch_id = Uuid::now_v7();
        let span = info_span!("batch", %batch_id, size = names.len());

        async {
            let tasks = match self.resolve(names).await {
                Ok(tasks) => tasks,
                Err(rejection) => {
                    warn!(%rejection, "Batch rejected, nothing fetched");
                    return Ok(BatchOutcome::Rejected(rejection));
                }
            };

            let total = tasks.len();
            for (enqueued, task) in tasks.into_iter().enumerate() {
                let name = task.name.clone();
                if let Err(source) = self.fetcher.enqueue(task).await {
                    error!(name = %name, enqueued, error = %source, "Failed to enqueue resource");
                    return Err(ServiceError::Enqueue {
                        name,
                        enqueued,
                        source,
                    });
                }
            }

            info!(tasks = total, "All resources enqueued, waiting for completion");
            let report = self.fetcher.wait().await;

            let failed = report.failed().count();
            if failed == 0 {
                info!(tasks = total, bytes = report.total_bytes(), "Batch completed");
            } else {
                warn!(tasks = total, failed, "Batch completed with failures");
            }

            Ok(BatchOutcome::Completed { batch_id, report })
        }
        .instrument(span)
        .await
    }

    /// Turn names into tasks; rejects on the first policy violation
    async fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<FetchTask>, Rejection> {
        let catalog = self.catalog.read().await;

        let mut tasks = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        for name in names.iter().map(AsRef::as_ref) {
            match catalog.resolve(name) {
                Some(resource) => {
                    tasks.push(FetchTask::from_resource(name, resource, &self.output_dir));
                }
                None => {
                    warn!(name, "Unknown resource");
                    unknown.push(name.to_string());
                }
            }
        }
        drop(catalog);

        if !unknown.is_empty() {
            return Err(Rejection::UnknownResources { names: unknown });
        }

        if self.duplicates == DuplicatePolicy::Reject {
            check_destinations(&tasks)?;
        }

        Ok(tasks)
    }
}

fn check_destinations(tasks: &[FetchTask]) -> Result<(), Rejection> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::with_capacity(tasks.len());
    for task in tasks {
        if let Some(first) = seen.insert(normalize(&task.destination), &task.name) {
            return Err(Rejection::DuplicateDestination {
                path: task.destination.clone(),
                first: first.to_string(),
                second: task.name.clone(),
            });
        }
    }
    Ok(())
}

/// Absolute form of `path` with `.` and `..` folded lexically
///
/// Symlinks are not resolved; the files need not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Resource;
    use crate::fetcher::FetchReport;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Records enqueued tasks instead of running them
    #[derive(Default)]
    struct RecordingFetcher {
        enqueued: std::sync::Mutex<Vec<FetchTask>>,
        waits: AtomicUsize,
        fail_after: Option<usize>,
        cancelled: AtomicBool,
    }

    #[async_trait]
    impl ResourceFetcher for RecordingFetcher {
        async fn enqueue(&self, task: FetchTask) -> Result<(), FetchError> {
            let mut enqueued = self.enqueued.lock().unwrap();
            if self.fail_after == Some(enqueued.len()) {
                return Err(FetchError::Cancelled);
            }
            enqueued.push(task);
            Ok(())
        }

        async fn wait(&self) -> FetchReport {
            self.waits.fetch_add(1, Ordering::SeqCst);
            FetchReport::default()
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    fn catalog() -> ResourceCatalog {
        let mut catalog = ResourceCatalog::new();
        catalog.insert("a", Resource::new("a.bin", "http://example.org/a"));
        catalog.insert("b", Resource::new("b.bin", "http://example.org/b"));
        catalog.insert("b-copy", Resource::new("b.bin", "http://mirror.example.org/b"));
        catalog.insert("a-dotted", Resource::new("sub/../a.bin", "http://mirror.example.org/a"));
        catalog
    }

    fn service(fetcher: Arc<RecordingFetcher>, duplicates: DuplicatePolicy) -> FetchService {
        let output = OutputConfig {
            dir: PathBuf::from("out"),
            duplicate_destinations: duplicates,
        };
        FetchService::new(catalog(), fetcher, &output)
    }

    #[tokio::test]
    async fn test_all_names_resolve_in_order() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Reject);

        let outcome = service.fetch(&["b", "a"]).await.unwrap();
        assert!(matches!(outcome, BatchOutcome::Completed { .. }));

        let enqueued = fetcher.enqueued.lock().unwrap();
        let names: Vec<&str> = enqueued.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(enqueued[1].destination, PathBuf::from("out/a.bin"));
        assert_eq!(fetcher.waits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_name_enqueues_nothing() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Reject);

        let outcome = service.fetch(&["a", "missing", "b", "gone"]).await.unwrap();
        match outcome {
            BatchOutcome::Rejected(Rejection::UnknownResources { names }) => {
                assert_eq!(names, vec!["missing", "gone"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert!(fetcher.enqueued.lock().unwrap().is_empty());
        assert_eq!(fetcher.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_destination_rejected() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Reject);

        let outcome = service.fetch(&["a", "b", "b-copy"]).await.unwrap();
        match outcome {
            BatchOutcome::Rejected(Rejection::DuplicateDestination { path, first, second }) => {
                assert_eq!(path, PathBuf::from("out/b.bin"));
                assert_eq!(first, "b");
                assert_eq!(second, "b-copy");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(fetcher.enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_destination_detected_after_normalizing() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Reject);

        let outcome = service.fetch(&["a", "a-dotted"]).await.unwrap();
        assert!(matches!(
            outcome,
            BatchOutcome::Rejected(Rejection::DuplicateDestination { ref second, .. })
                if second == "a-dotted"
        ));

        let absolute = std::env::current_dir().unwrap().join("out/b.bin");
        service
            .catalog()
            .write()
            .await
            .insert("b-absolute", Resource::new(absolute, "http://example.org/b"));

        let outcome = service.fetch(&["b", "b-absolute"]).await.unwrap();
        assert!(matches!(
            outcome,
            BatchOutcome::Rejected(Rejection::DuplicateDestination { .. })
        ));
        assert!(fetcher.enqueued.lock().unwrap().is_empty());
    }

    #[test]
    fn test_normalize_folds_dot_segments() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(normalize(Path::new("out/./x/../a.bin")), cwd.join("out/a.bin"));
        assert_eq!(normalize(Path::new("/data/../srv/k.bsp")), PathBuf::from("/srv/k.bsp"));
    }

    #[tokio::test]
    async fn test_duplicate_destination_allowed_by_policy() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Allow);

        let outcome = service.fetch(&["b", "b-copy"]).await.unwrap();
        assert!(matches!(outcome, BatchOutcome::Completed { .. }));
        assert_eq!(fetcher.enqueued.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_enqueue_failure_stops_dispatch_and_skips_wait() {
        let fetcher = Arc::new(RecordingFetcher {
            fail_after: Some(1),
            ..RecordingFetcher::default()
        });
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Reject);

        let result = service.fetch(&["a", "b"]).await;
        match result {
            Err(ServiceError::Enqueue { name, enqueued, .. }) => {
                assert_eq!(name, "b");
                assert_eq!(enqueued, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(fetcher.enqueued.lock().unwrap().len(), 1);
        assert_eq!(fetcher.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_catalog_edits_visible_to_next_batch() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Reject);

        assert!(matches!(
            service.fetch(&["c"]).await.unwrap(),
            BatchOutcome::Rejected(_)
        ));

        service
            .catalog()
            .write()
            .await
            .insert("c", Resource::new("c.bin", "http://example.org/c"));

        assert!(matches!(
            service.fetch(&["c"]).await.unwrap(),
            BatchOutcome::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn test_cancel_delegates_to_fetcher() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let service = service(Arc::clone(&fetcher), DuplicatePolicy::Reject);

        service.cancel();
        assert!(fetcher.cancelled.load(Ordering::SeqCst));
    }
}
