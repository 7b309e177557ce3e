//! First-run currency selection

use crate::config::DEFAULT_CURRENCY;
use crate::error::failure_message;
use crate::models::{CurrencyOption, UpdateProfileRequest};
use crate::scope::TaskScope;
use crate::session::AuthManager;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::ProfileUseCases;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const CURRENCIES: &[(&str, &str, &str)] = &[
    ("IDR", "Rp", "Indonesian Rupiah"),
    ("SGD", "S$", "Singapore Dollar"),
    ("MYR", "RM", "Malaysian Ringgit"),
    ("VND", "₫", "Vietnamese Dong"),
    ("THB", "฿", "Thai Baht"),
    ("PHP", "₱", "Philippine Peso"),
    ("BND", "B$", "Brunei Dollar"),
    ("KHR", "៛", "Cambodian Riel"),
    ("LAK", "₭", "Lao Kip"),
    ("MMK", "Ks", "Myanmar Kyat"),
    ("USD", "$", "US Dollar (East Timor also uses)"),
    ("CNY", "¥", "Chinese Yuan"),
    ("JPY", "¥", "Japanese Yen"),
    ("KRW", "₩", "South Korean Won"),
    ("INR", "₹", "Indian Rupee"),
    ("BDT", "৳", "Bangladeshi Taka"),
    ("PKR", "₨", "Pakistani Rupee"),
    ("LKR", "Rs", "Sri Lankan Rupee"),
    ("NPR", "₨", "Nepalese Rupee"),
    ("SAR", "﷼", "Saudi Riyal"),
    ("AED", "د.إ", "UAE Dirham"),
    ("QAR", "﷼", "Qatari Riyal"),
    ("KWD", "د.ك", "Kuwaiti Dinar"),
    ("OMR", "﷼", "Omani Rial"),
    ("BHD", "د.ب", "Bahraini Dinar"),
    ("USD", "$", "US Dollar"),
    ("CAD", "C$", "Canadian Dollar"),
    ("BRL", "R$", "Brazilian Real"),
    ("MXN", "$", "Mexican Peso"),
    ("ARS", "$", "Argentine Peso"),
    ("EUR", "€", "Euro"),
    ("GBP", "£", "British Pound"),
    ("CHF", "CHF", "Swiss Franc"),
    ("SEK", "kr", "Swedish Krona"),
    ("NOK", "kr", "Norwegian Krone"),
    ("DKK", "kr", "Danish Krone"),
    ("RUB", "₽", "Russian Ruble"),
    ("TRY", "₺", "Turkish Lira"),
    ("AUD", "A$", "Australian Dollar"),
    ("NZD", "NZ$", "New Zealand Dollar"),
    ("ZAR", "R", "South African Rand"),
    ("EGP", "£", "Egyptian Pound"),
    ("NGN", "₦", "Nigerian Naira"),
    ("KES", "KSh", "Kenyan Shilling"),
    ("GHS", "₵", "Ghanaian Cedi"),
];

/// Selectable currencies, one entry per code (first occurrence wins)
pub fn supported_currencies() -> Vec<CurrencyOption> {
    let mut seen = HashSet::new();
    CURRENCIES
        .iter()
        .filter(|(code, _, _)| seen.insert(*code))
        .map(|(code, symbol, name)| CurrencyOption::new(code, symbol, name))
        .collect()
}

fn find_currency(code: &str) -> Option<CurrencyOption> {
    supported_currencies()
        .into_iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupCurrencyUiState {
    pub currencies: Vec<CurrencyOption>,
    pub selected_currency: Option<CurrencyOption>,
    pub search_query: String,
    /// A stored currency exists; the choice can no longer change
    pub has_selected_currency: bool,
    pub is_loading: bool,
    pub is_success: bool,
    pub error_message: Option<String>,
}

impl Default for SetupCurrencyUiState {
    fn default() -> Self {
        Self {
            currencies: supported_currencies(),
            selected_currency: None,
            search_query: String::new(),
            has_selected_currency: false,
            is_loading: false,
            is_success: false,
            error_message: None,
        }
    }
}

#[derive(Clone)]
pub struct SetupCurrencyViewModel {
    state: StateContainer<SetupCurrencyUiState>,
    profile: Arc<dyn ProfileUseCases>,
    session: Arc<dyn AuthManager>,
    scope: TaskScope,
}

impl SetupCurrencyViewModel {
    /// Launches the stored-currency check immediately
    pub fn new(profile: Arc<dyn ProfileUseCases>, session: Arc<dyn AuthManager>, scope: TaskScope) -> Self {
        let vm = Self {
            state: StateContainer::new(SetupCurrencyUiState::default()),
            profile,
            session,
            scope,
        };
        vm.check_stored_currency();
        vm
    }

    pub fn state(&self) -> SetupCurrencyUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<SetupCurrencyUiState> {
        self.state.subscribe()
    }

    fn check_stored_currency(&self) {
        let this = self.clone();
        self.scope.launch("check_stored_currency", async move {
            let stored = match this.session.selected_currency().await {
                Ok(stored) => stored,
                Err(err) => {
                    warn!(error = %err, "Could not read stored currency");
                    None
                }
            };

            match stored.as_deref().and_then(find_currency) {
                Some(currency) => {
                    debug!(code = %currency.code, "Stored currency found");
                    this.state.update(|s| {
                        s.selected_currency = Some(currency);
                        s.has_selected_currency = true;
                    });
                }
                None => {
                    this.state.update(|s| {
                        if s.selected_currency.is_none() {
                            s.selected_currency = find_currency(DEFAULT_CURRENCY);
                        }
                    });
                }
            }
        });
    }

    pub fn on_search_query_change(&self, query: &str) {
        self.state.update(|s| s.search_query = query.to_string());
    }

    /// Currencies whose code, name or symbol contains the search query
    pub fn filtered_currencies(&self) -> Vec<CurrencyOption> {
        self.state.with(|s| {
            let query = s.search_query.trim().to_lowercase();
            if query.is_empty() {
                return s.currencies.clone();
            }
            s.currencies
                .iter()
                .filter(|c| {
                    c.code.to_lowercase().contains(&query)
                        || c.name.to_lowercase().contains(&query)
                        || c.symbol.to_lowercase().contains(&query)
                })
                .cloned()
                .collect()
        })
    }

    pub fn on_currency_selected(&self, currency: CurrencyOption) {
        self.state.update(|s| {
            if !s.has_selected_currency {
                s.selected_currency = Some(currency);
            }
        });
    }

    /// Remote failures are logged and dropped; the local copy is enough to
    /// continue.
    pub fn save_currency(&self) {
        let (selected, locked) = self
            .state
            .with(|s| (s.selected_currency.clone(), s.has_selected_currency));
        let currency = match selected {
            Some(currency) if !locked => currency,
            _ => return,
        };

        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("save_currency", async move {
            let request = UpdateProfileRequest {
                currency: Some(currency.code.clone()),
                ..UpdateProfileRequest::default()
            };
            if let Err(err) = this.profile.update_profile(request).await {
                warn!(error = %err, code = %currency.code, "Remote currency update failed, keeping local copy");
            }

            match this.session.save_currency(&currency.code).await {
                Ok(()) => {
                    info!(code = %currency.code, "Currency saved");
                    this.state.update(|s| {
                        s.is_loading = false;
                        s.is_success = true;
                    });
                }
                Err(err) => {
                    let message = failure_message(&err, "Failed to save currency");
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
