//! Account registration

use super::FILL_ALL_FIELDS;
use crate::error::failure_message;
use crate::scope::TaskScope;
use crate::session::AuthManager;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::AuthUseCases;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const MIN_PASSWORD_LENGTH: usize = 6;
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
const REGISTERED_TOAST: &str = "Account created successfully!";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegisterUiState {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub is_loading: bool,
    pub is_registered: bool,
    pub error_message: Option<String>,
    pub toast_message: Option<String>,
}

#[derive(Clone)]
pub struct RegisterViewModel {
    state: StateContainer<RegisterUiState>,
    auth: Arc<dyn AuthUseCases>,
    session: Arc<dyn AuthManager>,
    scope: TaskScope,
}

impl RegisterViewModel {
    pub fn new(auth: Arc<dyn AuthUseCases>, session: Arc<dyn AuthManager>, scope: TaskScope) -> Self {
        Self {
            state: StateContainer::new(RegisterUiState::default()),
            auth,
            session,
            scope,
        }
    }

    pub fn state(&self) -> RegisterUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<RegisterUiState> {
        self.state.subscribe()
    }

    pub fn on_name_change(&self, name: &str) {
        self.state.update(|s| {
            s.name = name.to_string();
            s.error_message = None;
        });
    }

    pub fn on_email_change(&self, email: &str) {
        self.state.update(|s| {
            s.email = email.to_string();
            s.error_message = None;
        });
    }

    pub fn on_phone_change(&self, phone: &str) {
        self.state.update(|s| {
            s.phone = phone.to_string();
            s.error_message = None;
        });
    }

    pub fn on_password_change(&self, password: &str) {
        self.state.update(|s| {
            s.password = password.to_string();
            s.error_message = None;
        });
    }

    fn validation_error(state: &RegisterUiState) -> Option<&'static str> {
        if state.name.trim().is_empty()
            || state.email.trim().is_empty()
            || state.phone.trim().is_empty()
            || state.password.trim().is_empty()
        {
            return Some(FILL_ALL_FIELDS);
        }
        if state.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Some(PASSWORD_TOO_SHORT);
        }
        None
    }

    pub fn register(&self) {
        let current = self.state.read();
        if let Some(message) = Self::validation_error(&current) {
            self.state.update(|s| s.error_message = Some(message.to_string()));
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
        self.scope.launch("register", async move {
            let result = match this
                .auth
                .register(
                    current.name.trim(),
                    current.email.trim(),
                    current.phone.trim(),
                    &current.password,
                )
                .await
            {
                Ok(token) => this.session.save_access_token(&token).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(()) => {
                    info!(email = %current.email.trim(), "Account registered");
                    this.state.update(|s| {
                        s.is_loading = false;
                        s.is_registered = true;
                        s.toast_message = Some(REGISTERED_TOAST.to_string());
                    });
                }
                Err(err) => {
                    warn!(error = %err, "Registration failed");
                    let message = failure_message(&err, "Registration failed");
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

    pub fn clear_toast(&self) {
        self.state.update(|s| s.toast_message = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemoryAuthManager;
    use crate::usecase::InMemoryBackend;

    fn fill(vm: &RegisterViewModel, password: &str) {
        vm.on_name_change("Ann");
        vm.on_email_change("ann@b.com");
        vm.on_phone_change("+628123456");
        vm.on_password_change(password);
    }

    #[tokio::test]
    async fn test_short_password_rejected_before_call() {
        let backend = InMemoryBackend::default();
        let scope = TaskScope::new("register");
        let vm = RegisterViewModel::new(
            Arc::new(backend.clone()),
            Arc::new(InMemoryAuthManager::new()),
            scope.clone(),
        );

        fill(&vm, "abc");
        vm.register();
        scope.settle().await;

        assert_eq!(
            vm.state().error_message.as_deref(),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(backend.calls("register"), 0);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let backend = InMemoryBackend::default();
        let scope = TaskScope::new("register");
        let vm = RegisterViewModel::new(
            Arc::new(backend.clone()),
            Arc::new(InMemoryAuthManager::new()),
            scope.clone(),
        );

        fill(&vm, "secret1");
        vm.on_name_change("   ");
        vm.register();

        assert_eq!(vm.state().error_message.as_deref(), Some("Please fill in all fields"));
        assert_eq!(backend.calls("register"), 0);
    }

    #[tokio::test]
    async fn test_whitespace_password_rejected() {
        let backend = InMemoryBackend::default();
        let session = InMemoryAuthManager::new();
        let scope = TaskScope::new("register");
        let vm = RegisterViewModel::new(
            Arc::new(backend.clone()),
            Arc::new(session.clone()),
            scope.clone(),
        );

        fill(&vm, "      ");
        vm.register();
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.error_message.as_deref(), Some("Please fill in all fields"));
        assert!(!state.is_registered);
        assert_eq!(backend.calls("register"), 0);
        assert_eq!(session.token_saves(), 0);
    }

    #[tokio::test]
    async fn test_register_success_saves_token_and_toasts() {
        let backend = InMemoryBackend::default();
        let session = InMemoryAuthManager::new();
        let scope = TaskScope::new("register");
        let vm = RegisterViewModel::new(
            Arc::new(backend.clone()),
            Arc::new(session.clone()),
            scope.clone(),
        );

        fill(&vm, "secret1");
        vm.register();
        scope.settle().await;

        let state = vm.state();
        assert!(state.is_registered);
        assert!(!state.is_loading);
        assert_eq!(state.toast_message.as_deref(), Some("Account created successfully!"));
        assert_eq!(session.token_saves(), 1);

        vm.clear_toast();
        assert_eq!(vm.state().toast_message, None);
    }

    #[tokio::test]
    async fn test_register_failure_keeps_flag_down() {
        let backend = InMemoryBackend::default();
        backend.fail("register", "");
        let scope = TaskScope::new("register");
        let vm = RegisterViewModel::new(
            Arc::new(backend.clone()),
            Arc::new(InMemoryAuthManager::new()),
            scope.clone(),
        );

        fill(&vm, "secret1");
        vm.register();
        scope.settle().await;

        let state = vm.state();
        assert!(!state.is_registered);
        assert_eq!(state.error_message.as_deref(), Some("Registration failed"));
    }
}
