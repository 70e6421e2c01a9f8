//! Fetcher counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters updated by fetch workers
#[derive(Debug, Default)]
pub struct FetchMetrics {
    tasks_started: AtomicU64,
    tasks_succeeded: AtomicU64,
    tasks_failed: AtomicU64,
    bytes_written: AtomicU64,
    tasks_running: AtomicUsize,
    peak_tasks_running: AtomicUsize,
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_started(&self) {
        self.tasks_started.fetch_add(1, Ordering::Relaxed);
        let now = self.tasks_running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_tasks_running.fetch_max(now, Ordering::SeqCst);
        tracing::trace!(tasks_running = now, "Task started");
    }

    pub fn task_succeeded(&self, bytes: u64) {
        self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
        self.tasks_running.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.tasks_running.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_started: self.tasks_started.load(Ordering::Relaxed),
            tasks_succeeded: self.tasks_succeeded.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            tasks_running: self.tasks_running.load(Ordering::SeqCst),
            peak_tasks_running: self.peak_tasks_running.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tasks_started: u64,
    pub tasks_succeeded: u64,
    pub tasks_failed: u64,
    pub bytes_written: u64,
    pub tasks_running: usize,
    /// Highest number of tasks ever running at the same time
    pub peak_tasks_running: usize,
}
