//! Password reset request

use crate::error::failure_message;
use crate::scope::TaskScope;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::AuthUseCases;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForgotPasswordUiState {
    pub email: String,
    pub is_loading: bool,
    pub is_email_sent: bool,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct ForgotPasswordViewModel {
    state: StateContainer<ForgotPasswordUiState>,
    auth: Arc<dyn AuthUseCases>,
    scope: TaskScope,
}

impl ForgotPasswordViewModel {
    pub fn new(auth: Arc<dyn AuthUseCases>, scope: TaskScope) -> Self {
        Self {
            state: StateContainer::new(ForgotPasswordUiState::default()),
            auth,
            scope,
        }
    }

    pub fn state(&self) -> ForgotPasswordUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<ForgotPasswordUiState> {
        self.state.subscribe()
    }

    pub fn on_email_change(&self, email: &str) {
        self.state.update(|s| {
            s.email = email.to_string();
            s.error_message = None;
        });
    }

    pub fn send_reset_link(&self) {
        let email = self.state.with(|s| s.email.trim().to_string());
        if email.is_empty() {
            self.state
                .update(|s| s.error_message = Some("Please enter your email".to_string()));
            return;
        }

        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("send_reset_link", async move {
            match this.auth.reset_password(&email).await {
                Ok(()) => {
                    info!(email = %email, "Reset link sent");
                    this.state.update(|s| {
                        s.is_loading = false;
                        s.is_email_sent = true;
                    });
                }
                Err(err) => {
                    warn!(error = %err, "Reset link failed");
                    let message = failure_message(&err, "Failed to send reset link");
                    this.state.update(|s| {
                        s.is_loading = false;
                        s.error_message = Some(message);
                    });
                }
            }
        });
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error_message = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::InMemoryBackend;

    #[tokio::test]
    async fn test_blank_email() {
        let backend = InMemoryBackend::default();
        let vm = ForgotPasswordViewModel::new(Arc::new(backend.clone()), TaskScope::new("forgot"));

        vm.on_email_change("  ");
        vm.send_reset_link();

        assert_eq!(vm.state().error_message.as_deref(), Some("Please enter your email"));
        assert_eq!(backend.calls("reset_password"), 0);
    }

    #[tokio::test]
    async fn test_reset_link_sent() {
        let backend = InMemoryBackend::default();
        backend.add_account("a@b.com", "secret1", None).await;
        let scope = TaskScope::new("forgot");
        let vm = ForgotPasswordViewModel::new(Arc::new(backend.clone()), scope.clone());

        vm.on_email_change("a@b.com");
        vm.send_reset_link();
        scope.settle().await;

        assert!(vm.state().is_email_sent);
        assert_eq!(backend.calls("reset_password"), 1);
    }

    #[tokio::test]
    async fn test_fallback_message() {
        let backend = InMemoryBackend::default();
        backend.fail("reset_password", " ");
        let scope = TaskScope::new("forgot");
        let vm = ForgotPasswordViewModel::new(Arc::new(backend.clone()), scope.clone());

        vm.on_email_change("a@b.com");
        vm.send_reset_link();
        scope.settle().await;

        let state = vm.state();
        assert!(!state.is_email_sent);
        assert_eq!(state.error_message.as_deref(), Some("Failed to send reset link"));
    }
}
