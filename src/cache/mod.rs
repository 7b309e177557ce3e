//! Time-bounded cache for summary data
//!
//! Replaces the per-screen "last fetch time + validity window" check. A value
//! is fresh iff `now - stamped_at < ttl`.

use crate::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += chrono::Duration::milliseconds(by.as_millis() as i64);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stamped_at: DateTime<Utc>,
}

/// A single cached value with a validity window
pub struct CachedValue<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> CachedValue<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value if still within the validity window
    pub fn fresh(&self) -> Option<T> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = slot.as_ref()?;
        // A clock that moved backwards yields a negative age and counts as fresh.
        let fresh = match (self.clock.now() - entry.stamped_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        };
        if fresh {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh().is_some()
    }

    pub fn store(&self, value: T) {
        let stamped_at = self.clock.now();
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Entry { value, stamped_at });
    }

    /// Restart the validity window of an existing entry. Nothing happens
    /// while the cache is empty.
    pub fn touch(&self) -> bool {
        let now = self.clock.now();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(entry) => {
                entry.stamped_at = now;
                true
            }
            None => false,
        }
    }

    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Return the fresh value unless `force`, otherwise run `loader` and cache
    /// its result. A failed load keeps the previous entry.
    pub async fn get<F, Fut>(&self, force: bool, loader: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !force {
            if let Some(value) = self.fresh() {
                debug!("Serving cached value");
                return Ok(value);
            }
        }

        let value = loader().await?;
        self.store(value.clone());
        Ok(value)
    }
}
