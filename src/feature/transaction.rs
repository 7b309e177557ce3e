//! Transaction history, search and CRUD

use super::events::SyncEvents;
use crate::cache::Clock;
use crate::error::{failure_message, CashaError};
use crate::models::{
    group_by_date, BudgetCategory, CashflowDateSection, CashflowEntry, CashflowFilter, Page,
    Transaction, TransactionRequest, THIS_MONTH,
};
use crate::scope::TaskScope;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::TransactionUseCases;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Enough rows to group a month client-side
const HISTORY_PAGE: Page = Page {
    page: 1,
    page_size: 100,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionAction {
    Added,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionUiState {
    /// Cashflow history of `selected_month`
    pub transactions: Vec<CashflowEntry>,
    /// Local transactions, the source for edits
    pub raw_transactions: Vec<Transaction>,
    pub categories: Vec<BudgetCategory>,
    /// "This month", "This year" or a `YYYY-MM` key
    pub selected_month: String,
    pub search_query: String,
    pub is_searching: bool,
    pub cashflow_sections: Vec<CashflowDateSection>,
    pub filtered_sections: Vec<CashflowDateSection>,
    pub is_loading: bool,
    pub completed: Option<TransactionAction>,
    pub error_message: Option<String>,
}

impl Default for TransactionUiState {
    fn default() -> Self {
        Self {
            transactions: Vec::new(),
            raw_transactions: Vec::new(),
            categories: Vec::new(),
            selected_month: THIS_MONTH.to_string(),
            search_query: String::new(),
            is_searching: false,
            cashflow_sections: Vec::new(),
            filtered_sections: Vec::new(),
            is_loading: false,
            completed: None,
            error_message: None,
        }
    }
}

fn validate(request: &TransactionRequest) -> Option<&'static str> {
    if request.name.trim().is_empty() {
        return Some("Please enter a transaction name");
    }
    if request.category.trim().is_empty() {
        return Some("Please select a category");
    }
    if request.amount <= 0.0 {
        return Some("Amount must be greater than 0");
    }
    None
}

#[derive(Clone)]
pub struct TransactionViewModel {
    state: StateContainer<TransactionUiState>,
    transactions: Arc<dyn TransactionUseCases>,
    events: SyncEvents,
    clock: Arc<dyn Clock>,
    scope: TaskScope,
}

impl TransactionViewModel {
    /// Loads history, syncs and fetches categories right away
    pub fn new(
        transactions: Arc<dyn TransactionUseCases>,
        events: SyncEvents,
        clock: Arc<dyn Clock>,
        scope: TaskScope,
    ) -> Self {
        let vm = Self {
            state: StateContainer::new(TransactionUiState::default()),
            transactions,
            events,
            clock,
            scope,
        };
        vm.fetch_history();
        vm.sync_data();
        vm.fetch_categories();
        vm
    }

    pub fn state(&self) -> TransactionUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<TransactionUiState> {
        self.state.subscribe()
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// History of the selected month together with the local transactions
    pub fn fetch_history(&self) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| s.is_loading = true);

        let this = self.clone();
        self.scope.launch("fetch_history", async move {
            let today = this.today();
            let filter = this.state.with(|s| CashflowFilter::from_selection(&s.selected_month, today));
            let (history, raw) = tokio::join!(
                this.transactions.cashflow_history(&filter, HISTORY_PAGE),
                this.transactions.transactions()
            );
            match history.and_then(|history| raw.map(|raw| (history, raw))) {
                Ok((history, raw)) => {
                    debug!(count = history.len(), period = %filter.label, "Cashflow history loaded");
                    let sections = group_by_date(&history, today);
                    this.state.update(|s| {
                        s.transactions = history;
                        s.raw_transactions = raw;
                        s.cashflow_sections = sections;
                        s.is_loading = false;
                    });
                }
                Err(err) => this.fail(&err, "Failed to fetch transactions"),
            }
        });
    }

    pub fn filter_by_month(&self, month: &str) {
        self.state.update(|s| s.selected_month = month.to_string());
        self.fetch_history();
    }

    /// Case-insensitive match on title or category over the loaded history
    pub fn search_transactions(&self, query: &str) {
        let today = self.today();
        self.state.update(|s| {
            let needle = query.to_lowercase();
            let is_searching = !query.is_empty();
            s.filtered_sections = if is_searching {
                let matched: Vec<CashflowEntry> = s
                    .transactions
                    .iter()
                    .filter(|e| {
                        e.title.to_lowercase().contains(&needle)
                            || e.category.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect();
                group_by_date(&matched, today)
            } else {
                Vec::new()
            };
            s.search_query = query.to_string();
            s.is_searching = is_searching;
        });
    }

    pub fn clear_search(&self) {
        self.state.update(|s| {
            s.search_query.clear();
            s.is_searching = false;
            s.filtered_sections.clear();
        });
    }

    /// Push and pull, then reload the history
    pub fn sync_data(&self) {
        self.start_loading();
        let this = self.clone();
        self.scope.launch("sync_data", async move {
            match this.transactions.sync_transactions().await {
                Ok(()) => this.fetch_history(),
                Err(err) => this.fail(&err, "Failed to sync transactions"),
            }
        });
    }

    /// Active categories only. Failures leave the picker empty.
    fn fetch_categories(&self) {
        let this = self.clone();
        self.scope.launch("fetch_categories", async move {
            match this.transactions.transaction_categories().await {
                Ok(categories) => {
                    let active: Vec<BudgetCategory> =
                        categories.into_iter().filter(|c| c.is_active).collect();
                    this.state.update(|s| s.categories = active);
                }
                Err(err) => debug!(error = %err, "Transaction categories unavailable"),
            }
        });
    }

    fn reject(&self, message: &str) {
        self.state.update(|s| s.error_message = Some(message.to_string()));
    }

    fn start_loading(&self) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });
    }

    fn fail(&self, err: &CashaError, fallback: &str) {
        warn!(error = %err, action = fallback, "Transaction action failed");
        let message = failure_message(err, fallback);
        self.state.update(|s| {
            s.is_loading = false;
            s.error_message = Some(message);
        });
    }

    fn succeed(&self, action: TransactionAction) {
        self.state.update(|s| s.completed = Some(action));
        self.events.emit();
        self.sync_data();
    }

    pub fn add_transaction(&self, request: TransactionRequest) {
        if let Some(message) = validate(&request) {
            return self.reject(message);
        }

        self.start_loading();
        let this = self.clone();
        self.scope.launch("add_transaction", async move {
            match this.transactions.add_transaction(request).await {
                Ok(transaction) => {
                    info!(transaction_id = %transaction.id, amount = transaction.amount, "Transaction added");
                    this.succeed(TransactionAction::Added);
                }
                Err(err) => this.fail(&err, "Failed to add transaction"),
            }
        });
    }

    /// Applies `request` on top of the locally stored transaction `id`
    pub fn update_transaction(&self, id: &str, request: TransactionRequest) {
        if let Some(message) = validate(&request) {
            return self.reject(message);
        }
        let existing = self
            .state
            .with(|s| s.raw_transactions.iter().find(|t| t.id == id).cloned());
        let Some(existing) = existing else {
            return self.reject("Transaction not found");
        };

        let updated = Transaction {
            name: request.name.trim().to_string(),
            category: request.category,
            amount: request.amount,
            datetime: request.datetime,
            note: request.note,
            ..existing
        };

        self.start_loading();
        let this = self.clone();
        self.scope.launch("update_transaction", async move {
            match this.transactions.update_transaction(updated).await {
                Ok(transaction) => {
                    info!(transaction_id = %transaction.id, "Transaction updated");
                    this.succeed(TransactionAction::Updated);
                }
                Err(err) => this.fail(&err, "Failed to update transaction"),
            }
        });
    }

    pub fn delete_transaction(&self, id: &str) {
        self.start_loading();
        let id = id.to_string();
        let this = self.clone();
        self.scope.launch("delete_transaction", async move {
            match this.transactions.delete_transaction(&id).await {
                Ok(()) => {
                    info!(transaction_id = %id, "Transaction deleted");
                    this.succeed(TransactionAction::Deleted);
                }
                Err(err) => this.fail(&err, "Failed to delete transaction"),
            }
        });
    }

    pub fn take_completed(&self) -> Option<TransactionAction> {
        let mut taken = None;
        self.state.update(|s| taken = s.completed.take());
        taken
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error_message = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::usecase::InMemoryBackend;
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 18, 0, 0).unwrap()
    }

    async fn setup() -> (TransactionViewModel, InMemoryBackend, TaskScope, SyncEvents) {
        let backend = InMemoryBackend::default();
        let events = SyncEvents::new();
        let scope = TaskScope::new("transactions");
        let vm = TransactionViewModel::new(
            Arc::new(backend.clone()),
            events.clone(),
            Arc::new(ManualClock::new(now())),
            scope.clone(),
        );
        scope.settle().await;
        backend.reset_calls();
        (vm, backend, scope, events)
    }

    fn request(name: &str, category: &str, amount: f64, day: u32) -> TransactionRequest {
        TransactionRequest {
            name: name.to_string(),
            category: category.to_string(),
            amount,
            datetime: Utc.with_ymd_and_hms(2026, 10, day, 9, 0, 0).unwrap(),
            note: None,
        }
    }

    async fn seeded() -> (TransactionViewModel, InMemoryBackend, TaskScope, SyncEvents) {
        let (vm, backend, scope, events) = setup().await;
        vm.add_transaction(request("Coffee", "Food", 30.0, 15));
        scope.settle().await;
        vm.add_transaction(request("Taxi", "Transport", 80.0, 14));
        scope.settle().await;
        vm.add_transaction(request("Groceries", "Food", 250.0, 2));
        scope.settle().await;
        backend.reset_calls();
        (vm, backend, scope, events)
    }

    #[tokio::test]
    async fn test_construction_loads_history_and_categories() {
        let backend = InMemoryBackend::default();
        let scope = TaskScope::new("transactions");
        let vm = TransactionViewModel::new(
            Arc::new(backend.clone()),
            SyncEvents::new(),
            Arc::new(ManualClock::new(now())),
            scope.clone(),
        );
        scope.settle().await;

        assert_eq!(backend.calls("sync_transactions"), 1);
        assert_eq!(backend.calls("cashflow_history"), 2);
        assert_eq!(backend.calls("transaction_categories"), 1);

        let state = vm.state();
        assert_eq!(state.selected_month, "This month");
        assert_eq!(state.categories.len(), 5);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_add_cascades_into_sync_and_history() {
        let (vm, backend, scope, events) = setup().await;
        let mut listener = events.subscribe();

        vm.add_transaction(request("Coffee", "Food", 30.0, 15));
        scope.settle().await;

        assert_eq!(backend.calls("add_transaction"), 1);
        assert_eq!(backend.calls("sync_transactions"), 1);
        assert_eq!(backend.calls("cashflow_history"), 1);
        assert!(listener.try_recv().is_ok());

        let state = vm.state();
        assert_eq!(state.transactions.len(), 1);
        assert_eq!(state.cashflow_sections[0].day, "Today");
        assert!(state.raw_transactions[0].is_synced);
        assert!(!state.is_loading);
        assert_eq!(vm.take_completed(), Some(TransactionAction::Added));
    }

    #[tokio::test]
    async fn test_validation_blocks_the_call() {
        let (vm, backend, _scope, _events) = setup().await;

        vm.add_transaction(request("  ", "Food", 10.0, 15));
        assert_eq!(
            vm.state().error_message.as_deref(),
            Some("Please enter a transaction name")
        );
        vm.add_transaction(request("Lunch", "", 10.0, 15));
        assert_eq!(vm.state().error_message.as_deref(), Some("Please select a category"));
        vm.add_transaction(request("Lunch", "Food", 0.0, 15));
        assert_eq!(
            vm.state().error_message.as_deref(),
            Some("Amount must be greater than 0")
        );
        assert_eq!(backend.calls("add_transaction"), 0);
    }

    #[tokio::test]
    async fn test_search_groups_matches_by_day() {
        let (vm, _backend, _scope, _events) = seeded().await;

        vm.search_transactions("FOOD");
        let state = vm.state();
        assert!(state.is_searching);
        let days: Vec<&str> = state.filtered_sections.iter().map(|s| s.day.as_str()).collect();
        assert_eq!(days, vec!["Today", "Friday"]);

        vm.search_transactions("tax");
        assert_eq!(vm.state().filtered_sections[0].items[0].title, "Taxi");
        assert_eq!(vm.state().filtered_sections[0].day, "Yesterday");

        vm.clear_search();
        let state = vm.state();
        assert!(!state.is_searching);
        assert!(state.search_query.is_empty());
        assert!(state.filtered_sections.is_empty());
    }

    #[tokio::test]
    async fn test_month_filter_refetches() {
        let (vm, backend, scope, _events) = seeded().await;

        vm.filter_by_month("2026-09");
        scope.settle().await;
        assert_eq!(backend.calls("cashflow_history"), 1);
        assert!(vm.state().transactions.is_empty());

        vm.filter_by_month("This year");
        scope.settle().await;
        assert_eq!(vm.state().transactions.len(), 3);
    }

    #[tokio::test]
    async fn test_update_applies_to_stored_transaction() {
        let (vm, _backend, scope, _events) = seeded().await;
        let id = vm.state().raw_transactions[1].id.clone();

        vm.update_transaction(&id, request("Airport taxi", "Transport", 120.0, 14));
        scope.settle().await;

        let state = vm.state();
        let taxi = state.raw_transactions.iter().find(|t| t.id == id).unwrap();
        assert_eq!(taxi.name, "Airport taxi");
        assert_eq!(taxi.amount, 120.0);
        assert_eq!(vm.take_completed(), Some(TransactionAction::Updated));
    }

    #[tokio::test]
    async fn test_update_of_unknown_id_is_rejected() {
        let (vm, backend, _scope, _events) = setup().await;
        vm.update_transaction("missing", request("Taxi", "Transport", 10.0, 14));

        let state = vm.state();
        assert_eq!(state.error_message.as_deref(), Some("Transaction not found"));
        assert!(!state.is_loading);
        assert_eq!(backend.calls("update_transaction"), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_list() {
        let (vm, backend, scope, _events) = seeded().await;
        backend.fail("delete_transaction", "");
        let id = vm.state().raw_transactions[0].id.clone();

        vm.delete_transaction(&id);
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.transactions.len(), 3);
        assert!(!state.is_loading);
        assert_eq!(state.error_message.as_deref(), Some("Failed to delete transaction"));
        assert_eq!(backend.calls("sync_transactions"), 0);
    }

    #[tokio::test]
    async fn test_failed_sync_surfaces_message() {
        let (vm, backend, scope, _events) = setup().await;
        backend.fail("sync_transactions", "Server is busy");

        vm.sync_data();
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.error_message.as_deref(), Some("Server is busy"));
        assert!(!state.is_loading);
        assert_eq!(backend.calls("cashflow_history"), 0);
    }
}
