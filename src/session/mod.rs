//! Persisted session values (access token and selected currency)

use crate::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for the credentials produced by a successful sign-in
#[async_trait::async_trait]
pub trait AuthManager: Send + Sync {
    async fn save_access_token(&self, token: &str) -> Result<()>;
    async fn access_token(&self) -> Result<Option<String>>;
    async fn save_currency(&self, code: &str) -> Result<()>;
    async fn selected_currency(&self) -> Result<Option<String>>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
struct SessionSlots {
    token: Option<String>,
    currency: Option<String>,
}

/// Process-local session store
#[derive(Clone, Default)]
pub struct InMemoryAuthManager {
    slots: Arc<RwLock<SessionSlots>>,
    token_saves: Arc<AtomicUsize>,
    currency_saves: Arc<AtomicUsize>,
}

impl InMemoryAuthManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with a currency already chosen
    pub fn with_currency(code: &str) -> Self {
        let manager = Self::default();
        if let Ok(mut slots) = manager.slots.try_write() {
            slots.currency = Some(code.to_string());
        }
        manager
    }

    pub fn token_saves(&self) -> usize {
        self.token_saves.load(Ordering::SeqCst)
    }

    pub fn currency_saves(&self) -> usize {
        self.currency_saves.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AuthManager for InMemoryAuthManager {
    async fn save_access_token(&self, token: &str) -> Result<()> {
        self.slots.write().await.token = Some(token.to_string());
        self.token_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.slots.read().await.token.clone())
    }

    async fn save_currency(&self, code: &str) -> Result<()> {
        self.slots.write().await.currency = Some(code.to_string());
        self.currency_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn selected_currency(&self) -> Result<Option<String>> {
        Ok(self.slots.read().await.currency.clone())
    }

    async fn clear(&self) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.token = None;
        slots.currency = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_read_back() {
        let session = InMemoryAuthManager::new();
        tokio_test::block_on(session.save_access_token("T")).unwrap();
        tokio_test::block_on(session.save_currency("IDR")).unwrap();

        let token = tokio_test::block_on(session.access_token()).unwrap();
        let currency = tokio_test::block_on(session.selected_currency()).unwrap();
        assert_eq!(token.as_deref(), Some("T"));
        assert_eq!(currency.as_deref(), Some("IDR"));
        assert_eq!(session.token_saves(), 1);
        assert_eq!(session.currency_saves(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let session = InMemoryAuthManager::with_currency("SGD");
        session.save_access_token("T").await.unwrap();
        session.clear().await.unwrap();

        assert!(session.access_token().await.unwrap().is_none());
        assert!(session.selected_currency().await.unwrap().is_none());
    }

    #[test]
    fn test_with_currency_does_not_count_as_save() {
        let session = InMemoryAuthManager::with_currency("SGD");
        assert_eq!(session.currency_saves(), 0);
    }
}
