//! Count of spawned tasks that have not finished yet

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Wait-group style counter, kept apart from the admission semaphore so
/// waiting for completion never consumes capacity
#[derive(Debug, Default)]
pub(crate) struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

impl Outstanding {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one task; it stays outstanding until the guard drops
    pub(crate) fn track(self: &Arc<Self>) -> OutstandingGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        OutstandingGuard {
            outstanding: Arc::clone(self),
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolve once no tracked task remains
    pub(crate) async fn idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a release between the load and the
            // await is not missed.
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements the counter on drop, including during a panic unwind
#[derive(Debug)]
pub(crate) struct OutstandingGuard {
    outstanding: Arc<Outstanding>,
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        if self.outstanding.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.outstanding.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_idle_returns_immediately_when_empty() {
        let outstanding = Outstanding::new();
        timeout(Duration::from_millis(100), outstanding.idle())
            .await
            .expect("idle should not block with nothing tracked");
    }

    #[tokio::test]
    async fn test_idle_waits_for_every_guard() {
        let outstanding = Outstanding::new();
        let first = outstanding.track();
        let second = outstanding.track();
        assert_eq!(outstanding.count(), 2);

        let waiter = {
            let outstanding = Arc::clone(&outstanding);
            tokio::spawn(async move { outstanding.idle().await })
        };

        drop(first);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(second);
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("idle should resolve after the last guard drops")
            .unwrap();
        assert_eq!(outstanding.count(), 0);
    }

    #[tokio::test]
    async fn test_guard_released_on_panic() {
        let outstanding = Outstanding::new();
        let guard = outstanding.track();

        let handle: tokio::task::JoinHandle<()> = tokio::spawn(async move {
            let _guard = guard;
            panic!("worker blew up");
        });
        assert!(handle.await.is_err());

        timeout(Duration::from_secs(1), outstanding.idle())
            .await
            .expect("panicking task must not leak its slot");
    }
}
