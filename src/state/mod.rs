//! Observable UI-state container
//!
//! One writer (the state holder), any number of readers. Every change is
//! published as a whole new snapshot; readers either poll `read()` or
//! subscribe and await changes.

use crate::error::CashaError;
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

struct Inner<S> {
    sender: watch::Sender<S>,
    version: AtomicU64,
}

/// Single-value broadcast of an immutable snapshot
pub struct StateContainer<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for StateContainer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> StateContainer<S>
where
    S: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                sender,
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Latest snapshot
    pub fn read(&self) -> S {
        self.inner.sender.borrow().clone()
    }

    /// Inspect the latest snapshot without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.sender.borrow())
    }

    /// Apply `transform` to a copy of the current snapshot and publish the
    /// result. Runs under the writer lock, so concurrent updates compose in
    /// order. Returns whether the snapshot changed; observers are only woken
    /// when it did.
    pub fn update<F>(&self, transform: F) -> bool
    where
        F: FnOnce(&mut S),
    {
        let version = &self.inner.version;
        self.inner.sender.send_if_modified(|current| {
            let mut next = current.clone();
            transform(&mut next);
            if next == *current {
                return false;
            }
            *current = next;
            version.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    /// Swap in an entirely new snapshot
    pub fn replace(&self, value: S) -> bool {
        self.update(move |state| *state = value)
    }

    /// Number of published changes so far
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> StateObserver<S> {
        StateObserver {
            receiver: self.inner.sender.subscribe(),
        }
    }
}

/// Read-only handle given to views
pub struct StateObserver<S> {
    receiver: watch::Receiver<S>,
}

impl<S: Clone> StateObserver<S> {
    pub fn current(&self) -> S {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot
    pub async fn changed(&mut self) -> Result<S> {
        self.receiver
            .changed()
            .await
            .map_err(|_| CashaError::StateClosed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        value: u32,
        error_message: Option<String>,
    }

    #[test]
    fn test_update_replaces_snapshot() {
        let state = StateContainer::new(Counter::default());
        assert!(state.update(|s| s.value = 3));
        assert_eq!(state.read().value, 3);
        assert_eq!(state.version(), 1);
    }

    #[test]
    fn test_unchanged_update_is_noop() {
        let state = StateContainer::new(Counter::default());
        let observer = state.subscribe();

        assert!(!state.update(|s| s.error_message = None));
        assert_eq!(state.version(), 0);
        assert!(!observer.receiver.has_changed().unwrap());
    }

    #[test]
    fn test_replace() {
        let state = StateContainer::new(Counter { value: 9, error_message: None });
        state.replace(Counter::default());
        assert_eq!(state.read(), Counter::default());
    }

    #[tokio::test]
    async fn test_concurrent_updates_compose() {
        let state = StateContainer::new(Counter::default());
        let mut handles = Vec::new();

        for _ in 0..50 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                state.update(|s| s.value += 1);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(state.read().value, 50);
        assert_eq!(state.version(), 50);
    }

    #[tokio::test]
    async fn test_observer_sees_changes() {
        let state = StateContainer::new(Counter::default());
        let mut observer = state.subscribe();

        state.update(|s| s.value = 7);
        let seen = observer.changed().await.unwrap();
        assert_eq!(seen.value, 7);
        assert_eq!(observer.current().value, 7);
    }

    #[tokio::test]
    async fn test_observer_closed_after_writer_dropped() {
        let state = StateContainer::new(Counter::default());
        let mut observer = state.subscribe();
        drop(state);

        assert!(matches!(observer.changed().await, Err(CashaError::StateClosed)));
    }
}
