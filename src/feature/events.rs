//! Cross-screen notice that local cashflow data changed

use tokio::sync::broadcast;
use tracing::debug;

const CAPACITY: usize = 16;

/// Fan-out bus. Holders that mutate transactions emit; the dashboard listens.
#[derive(Clone)]
pub struct SyncEvents {
    tx: broadcast::Sender<()>,
}

impl SyncEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// No-op when nobody listens
    pub fn emit(&self) {
        let listeners = self.tx.send(()).unwrap_or(0);
        debug!(listeners, "Sync completed");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for SyncEvents {
    fn default() -> Self {
        Self::new()
    }
}
