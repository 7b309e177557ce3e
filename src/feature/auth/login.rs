//! Email/password and Google sign-in

use super::FILL_ALL_FIELDS;
use crate::error::failure_message;
use crate::models::LoginResult;
use crate::scope::TaskScope;
use crate::session::AuthManager;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::AuthUseCases;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoginUiState {
    pub email: String,
    pub password: String,
    pub is_loading: bool,
    pub is_logged_in: bool,
    /// Signed in, but the account has no currency yet
    pub needs_currency_setup: bool,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct LoginViewModel {
    state: StateContainer<LoginUiState>,
    auth: Arc<dyn AuthUseCases>,
    session: Arc<dyn AuthManager>,
    scope: TaskScope,
}

impl LoginViewModel {
    pub fn new(auth: Arc<dyn AuthUseCases>, session: Arc<dyn AuthManager>, scope: TaskScope) -> Self {
        Self {
            state: StateContainer::new(LoginUiState::default()),
            auth,
            session,
            scope,
        }
    }

    pub fn state(&self) -> LoginUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<LoginUiState> {
        self.state.subscribe()
    }

    pub fn on_email_change(&self, email: &str) {
        self.state.update(|s| {
            s.email = email.to_string();
            s.error_message = None;
        });
    }

    pub fn on_password_change(&self, password: &str) {
        self.state.update(|s| {
            s.password = password.to_string();
            s.error_message = None;
        });
    }

    pub fn login(&self) {
        let (email, password) = self
            .state
            .with(|s| (s.email.trim().to_string(), s.password.clone()));
        if email.is_empty() || password.trim().is_empty() {
            self.state.update(|s| s.error_message = Some(FILL_ALL_FIELDS.to_string()));
            return;
        }

        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        debug!(email = %email, "Launching login");
        let this = self.clone();
        self.scope.launch("login", async move {
            let result = this.auth.login(&email, &password).await;
            this.finish(result, "Login failed").await;
        });
    }

    pub fn google_login(&self, id_token: &str) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let id_token = id_token.to_string();
        let this = self.clone();
        self.scope.launch("google_login", async move {
            let result = this.auth.google_login(&id_token).await;
            this.finish(result, "Google login failed").await;
        });
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error_message = None);
    }

    /// Token first, then the currency, before the state flips to signed in
    async fn persist(&self, login: &LoginResult) -> Result<()> {
        self.session.save_access_token(&login.token).await?;
        if let Some(currency) = &login.currency {
            self.session.save_currency(currency).await?;
        }
        Ok(())
    }

    async fn finish(&self, result: Result<LoginResult>, fallback: &str) {
        let outcome = match result {
            Ok(login) => self.persist(&login).await.map(|_| login),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(login) => {
                let has_currency = login.currency.is_some();
                info!(has_currency, "Login succeeded");
                self.state.update(|s| {
                    s.is_loading = false;
                    s.is_logged_in = has_currency;
                    s.needs_currency_setup = !has_currency;
                });
            }
            Err(err) => {
                warn!(error = %err, "Login failed");
                let message = failure_message(&err, fallback);
                self.state.update(|s| {
                    s.is_loading = false;
                    s.error_message = Some(message);
                });
            }
        }
    }
}
