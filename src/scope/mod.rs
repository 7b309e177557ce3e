//! Explicit task scope owned by a screen
//!
//! Every intent handler launches its work here. Tearing the scope down
//! cancels whatever is still outstanding; nothing is compensated or rolled
//! back, the tasks simply stop at their next await point.

use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

struct ScopeInner {
    name: String,
    token: CancellationToken,
    tracker: TaskTracker,
}

/// Cancellable group of tasks. Clones share the same group.
#[derive(Clone)]
pub struct TaskScope {
    inner: Arc<ScopeInner>,
}

impl TaskScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name: name.into(),
                token: CancellationToken::new(),
                tracker: TaskTracker::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Spawn `task` into the scope. Ignored once the scope is shut down.
    pub fn launch<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.inner.token.is_cancelled() {
            debug!(scope = %self.inner.name, task = label, "Scope shut down, task not launched");
            return;
        }

        let token = self.inner.token.clone();
        let scope = self.inner.name.clone();
        self.inner.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(scope = %scope, task = label, "Task cancelled");
                }
                _ = task => {}
            }
        });
    }

    /// Number of tasks still running
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Wait until no task is in flight, including tasks launched by tasks
    /// while waiting (cascade refreshes).
    pub async fn settle(&self) {
        loop {
            self.inner.tracker.close();
            self.inner.tracker.wait().await;
            if self.inner.token.is_cancelled() {
                return;
            }
            self.inner.tracker.reopen();
            if self.inner.tracker.is_empty() {
                return;
            }
        }
    }

    /// Cancel outstanding tasks without waiting for them
    pub fn cancel(&self) {
        self.inner.token.cancel();
        self.inner.tracker.close();
    }

    /// Cancel outstanding tasks and wait until they are gone
    pub async fn shutdown(&self) {
        debug!(scope = %self.inner.name, in_flight = self.in_flight(), "Shutting down scope");
        self.cancel();
        self.inner.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_settle_waits_for_nested_tasks() {
        let scope = TaskScope::new("test");
        let hits = Arc::new(AtomicUsize::new(0));

        let outer_scope = scope.clone();
        let outer_hits = Arc::clone(&hits);
        scope.launch("outer", async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            outer_hits.fetch_add(1, Ordering::SeqCst);
            let inner_hits = Arc::clone(&outer_hits);
            outer_scope.launch("inner", async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                inner_hits.fetch_add(1, Ordering::SeqCst);
            });
        });

        scope.settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(scope.in_flight(), 0);

        // scope still usable after settling
        let again = Arc::clone(&hits);
        scope.launch("again", async move {
            again.fetch_add(1, Ordering::SeqCst);
        });
        scope.settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_outstanding_tasks() {
        let scope = TaskScope::new("test");
        let finished = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&finished);
        scope.launch("slow", async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });

        scope.shutdown().await;
        assert!(scope.is_shut_down());
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert_eq!(scope.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_launch_after_shutdown_is_ignored() {
        let scope = TaskScope::new("test");
        scope.shutdown().await;

        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);
        scope.launch("late", async move {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        scope.settle().await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
