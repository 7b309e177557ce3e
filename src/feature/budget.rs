//! Monthly budgets, offline sync and the budget advisor

use crate::error::{failure_message, CashaError};
use crate::models::{
    month_display, month_key, ApplyRecommendationsRequest, Budget, BudgetCategory, BudgetSummary,
    FinancialRecommendationResponse, FixedExpenses, NewBudgetRequest, RecommendedBudgetPayload,
};
use crate::scope::TaskScope;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::BudgetUseCases;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const SELECT_CATEGORY: &str = "Please select a category";
const AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than 0";

/// One-shot outcome the screen reacts to (dismiss a sheet, show a toast)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetAction {
    Added,
    Updated,
    Deleted,
    RecommendationsApplied,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetUiState {
    /// `YYYY-MM`
    pub current_month: String,
    pub budgets: Vec<Budget>,
    pub summary: Option<BudgetSummary>,
    pub categories: Vec<BudgetCategory>,
    pub is_online: bool,
    pub is_loading: bool,
    pub recommendation: Option<FinancialRecommendationResponse>,
    pub is_recommendation_loading: bool,
    pub completed: Option<BudgetAction>,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct BudgetViewModel {
    state: StateContainer<BudgetUiState>,
    budgets: Arc<dyn BudgetUseCases>,
    scope: TaskScope,
}

impl BudgetViewModel {
    pub fn new(budgets: Arc<dyn BudgetUseCases>, scope: TaskScope, today: NaiveDate) -> Self {
        Self {
            state: StateContainer::new(BudgetUiState {
                current_month: month_key(today),
                ..BudgetUiState::default()
            }),
            budgets,
            scope,
        }
    }

    pub fn state(&self) -> BudgetUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<BudgetUiState> {
        self.state.subscribe()
    }

    /// Share of `budget` already spent, clamped to `0.0..=1.0`
    pub fn progress(budget: &Budget) -> f64 {
        budget.progress()
    }

    /// Follow connectivity changes until the sender goes away. Coming online
    /// pushes local edits; the first emission always refreshes.
    pub fn watch_network(&self, mut network: watch::Receiver<bool>) {
        let this = self.clone();
        self.scope.launch("watch_network", async move {
            let mut first = true;
            loop {
                let online = *network.borrow_and_update();
                debug!(online, "Connectivity changed");
                this.state.update(|s| s.is_online = online);

                if online {
                    if let Err(err) = this.budgets.sync_local_to_remote().await {
                        warn!(error = %err, "Pushing local budgets failed");
                    }
                }
                if online || first {
                    this.load().await;
                }
                first = false;

                if network.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    pub fn set_online(&self, online: bool) {
        self.state.update(|s| s.is_online = online);
    }

    pub fn set_month(&self, month: &str) {
        self.state.update(|s| s.current_month = month.to_string());
        self.refresh_budget_data();
    }

    pub fn refresh_budget_data(&self) {
        let this = self.clone();
        self.scope.launch("refresh_budget_data", async move {
            this.load().await;
        });
    }

    async fn load(&self) {
        let (month, online) = self
            .state
            .with(|s| (s.current_month.clone(), s.is_online));
        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let result = async {
            let categories: Vec<BudgetCategory> = self
                .budgets
                .fetch_categories()
                .await?
                .into_iter()
                .filter(|c| c.is_active)
                .collect();

            let mut sync_error = None;
            if online {
                if let Err(err) = self.budgets.sync_all_budgets(&month).await {
                    warn!(error = %err, month = %month, "Budget sync failed");
                    sync_error = Some(format!("Sync failed: {}", failure_message(&err, "unknown error")));
                }
            }

            let budgets = self.budgets.fetch_budgets(&month).await?;
            let summary = if online {
                match self.budgets.budget_summary(&month).await {
                    Ok(summary) => summary,
                    Err(err) => {
                        debug!(error = %err, "Remote summary unavailable, computing locally");
                        self.budgets.calculate_local_summary(&budgets)
                    }
                }
            } else {
                self.budgets.calculate_local_summary(&budgets)
            };

            Ok::<_, CashaError>((categories, budgets, summary, sync_error))
        }
        .await;

        match result {
            Ok((categories, budgets, summary, sync_error)) => {
                debug!(month = %month, count = budgets.len(), "Budgets loaded");
                self.state.update(|s| {
                    s.categories = categories;
                    s.budgets = budgets;
                    s.summary = Some(summary);
                    s.is_loading = false;
                    s.error_message = sync_error;
                });
            }
            Err(err) => {
                warn!(error = %err, "Refreshing budget data failed");
                let message = failure_message(&err, "Failed to refresh budget data");
                self.state.update(|s| {
                    s.is_loading = false;
                    s.error_message = Some(message);
                });
            }
        }
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
        warn!(error = %err, action = fallback, "Budget action failed");
        let message = failure_message(err, fallback);
        self.state.update(|s| {
            s.is_loading = false;
            s.error_message = Some(message);
        });
    }

    fn succeed(&self, action: BudgetAction) {
        self.state.update(|s| {
            s.is_loading = false;
            s.completed = Some(action);
        });
        self.refresh_budget_data();
    }

    pub fn add_budget(&self, category: &str, amount: f64) {
        if category.trim().is_empty() {
            return self.reject(SELECT_CATEGORY);
        }
        if amount <= 0.0 {
            return self.reject(AMOUNT_NOT_POSITIVE);
        }

        self.start_loading();
        let request = NewBudgetRequest {
            id: None,
            amount,
            month: self.state.with(|s| s.current_month.clone()),
            category: category.trim().to_string(),
        };

        let this = self.clone();
        self.scope.launch("add_budget", async move {
            match this.budgets.add_budget(request).await {
                Ok(budget) => {
                    info!(budget_id = %budget.id, category = %budget.category, "Budget added");
                    this.succeed(BudgetAction::Added);
                }
                Err(err) => this.fail(&err, "Failed to add budget"),
            }
        });
    }

    pub fn update_budget(&self, id: Option<&str>, category: &str, amount: f64) {
        let id = match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => return self.reject("Budget ID is missing"),
        };
        if amount <= 0.0 {
            return self.reject(AMOUNT_NOT_POSITIVE);
        }

        self.start_loading();
        let request = NewBudgetRequest {
            id: Some(id.clone()),
            amount,
            month: self.state.with(|s| s.current_month.clone()),
            category: category.to_string(),
        };

        let this = self.clone();
        self.scope.launch("update_budget", async move {
            match this.budgets.update_budget(&id, request).await {
                Ok(_) => {
                    info!(budget_id = %id, amount, "Budget updated");
                    this.succeed(BudgetAction::Updated);
                }
                Err(err) => this.fail(&err, "Failed to update budget"),
            }
        });
    }

    pub fn delete_budget(&self, id: &str) {
        self.start_loading();
        let id = id.to_string();
        let this = self.clone();
        self.scope.launch("delete_budget", async move {
            match this.budgets.delete_budget(&id).await {
                Ok(()) => {
                    info!(budget_id = %id, "Budget deleted");
                    this.succeed(BudgetAction::Deleted);
                }
                Err(err) => this.fail(&err, "Failed to delete budget"),
            }
        });
    }

    pub fn fetch_recommendations(&self, monthly_income: f64, fixed_expenses: FixedExpenses) {
        if monthly_income <= 0.0 {
            return self.reject("Monthly income must be greater than 0");
        }

        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_recommendation_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("fetch_recommendations", async move {
            match this
                .budgets
                .recommendations(monthly_income, &fixed_expenses)
                .await
            {
                Ok(recommendation) => {
                    debug!(count = recommendation.recommendations.len(), "Recommendations received");
                    this.state.update(|s| {
                        s.is_recommendation_loading = false;
                        s.recommendation = Some(recommendation);
                    });
                }
                Err(err) => {
                    warn!(error = %err, "Fetching recommendations failed");
                    let message = failure_message(&err, "Failed to fetch recommendations");
                    this.state.update(|s| {
                        s.is_recommendation_loading = false;
                        s.error_message = Some(message);
                    });
                }
            }
        });
    }

    /// Turn the current recommendations into budgets for the current month.
    /// Returns false when there is nothing to apply.
    pub fn apply_recommended_budgets(&self) -> bool {
        let (month, payloads) = self.state.with(|s| {
            let payloads: Vec<RecommendedBudgetPayload> = s
                .recommendation
                .iter()
                .flat_map(|r| r.recommendations.iter())
                .filter(|r| r.suggested_amount > 0.0)
                .map(|r| RecommendedBudgetPayload {
                    amount: r.suggested_amount,
                    category: r.category.clone(),
                })
                .collect();
            (s.current_month.clone(), payloads)
        });

        if payloads.is_empty() {
            self.reject("No recommendations to apply");
            return false;
        }

        self.start_loading();
        let request = ApplyRecommendationsRequest {
            month: month_display(&month),
            budgets: payloads,
        };

        let this = self.clone();
        self.scope.launch("apply_recommendations", async move {
            let count = request.budgets.len();
            match this.budgets.apply_recommendations(request).await {
                Ok(()) => {
                    info!(count, "Recommended budgets applied");
                    this.succeed(BudgetAction::RecommendationsApplied);
                }
                Err(err) => this.fail(&err, "Failed to apply recommendations"),
            }
        });
        true
    }

    pub fn take_completed(&self) -> Option<BudgetAction> {
        let mut taken = None;
        self.state.update(|s| taken = s.completed.take());
        taken
    }

    /// Back to an empty screen for the same month and connectivity
    pub fn clear_data(&self) {
        self.state.update(|s| {
            *s = BudgetUiState {
                current_month: s.current_month.clone(),
                is_online: s.is_online,
                ..BudgetUiState::default()
            };
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
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn setup() -> (BudgetViewModel, InMemoryBackend, TaskScope) {
        let backend = InMemoryBackend::default();
        let scope = TaskScope::new("budget");
        let vm = BudgetViewModel::new(Arc::new(backend.clone()), scope.clone(), today());
        (vm, backend, scope)
    }

    fn budget(category: &str, amount: f64, spent: f64) -> Budget {
        Budget {
            id: format!("b-{}", category.to_lowercase()),
            amount,
            spent,
            remaining: amount - spent,
            period: "2026-10".to_string(),
            category: category.to_string(),
            currency: "IDR".to_string(),
            is_synced: false,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_current_month_on_construction() {
        let (vm, _backend, _scope) = setup();
        assert_eq!(vm.state().current_month, "2026-10");
    }

    #[tokio::test]
    async fn test_refresh_offline_uses_local_summary() {
        let (vm, backend, scope) = setup();
        backend.insert_budget(budget("Food", 100.0, 40.0)).await;

        vm.refresh_budget_data();
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.budgets.len(), 1);
        assert_eq!(state.summary.as_ref().unwrap().total_spent, 40.0);
        assert!(state.categories.iter().all(|c| c.is_active));
        assert_eq!(state.categories.len(), 5);
        assert_eq!(backend.calls("sync_all_budgets"), 0);
        assert_eq!(backend.calls("budget_summary"), 0);
        assert_eq!(backend.calls("calculate_local_summary"), 1);
    }

    #[tokio::test]
    async fn test_sync_failure_is_reported_but_loading_continues() {
        let (vm, backend, scope) = setup();
        backend.insert_budget(budget("Food", 100.0, 40.0)).await;
        backend.fail("sync_all_budgets", "timeout");
        backend.fail("budget_summary", "");
        vm.set_online(true);

        vm.refresh_budget_data();
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.error_message.as_deref(), Some("Sync failed: timeout"));
        assert_eq!(state.budgets.len(), 1);
        assert!(state.summary.is_some());
        assert_eq!(backend.calls("calculate_local_summary"), 1);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_refresh_failure_uses_fallback() {
        let (vm, backend, scope) = setup();
        backend.fail("fetch_budgets", "");

        vm.refresh_budget_data();
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.error_message.as_deref(), Some("Failed to refresh budget data"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_categories_untouched() {
        let (vm, backend, scope) = setup();
        backend.fail("fetch_budgets", "boom");

        vm.refresh_budget_data();
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.error_message.as_deref(), Some("boom"));
        assert!(state.categories.is_empty());
        assert!(state.budgets.is_empty());
        assert_eq!(state.summary, None);
        assert_eq!(backend.calls("fetch_categories"), 1);
    }

    #[tokio::test]
    async fn test_add_budget_validation() {
        let (vm, backend, _scope) = setup();

        vm.add_budget("", 100.0);
        assert_eq!(vm.state().error_message.as_deref(), Some("Please select a category"));

        vm.add_budget("Food", 0.0);
        assert_eq!(vm.state().error_message.as_deref(), Some("Amount must be greater than 0"));
        assert_eq!(backend.calls("add_budget"), 0);
    }

    #[tokio::test]
    async fn test_add_budget_cascades_refresh() {
        let (vm, backend, scope) = setup();

        vm.add_budget("Food", 250.0);
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.budgets.len(), 1);
        assert_eq!(state.summary.as_ref().unwrap().total_budget, 250.0);
        assert_eq!(backend.calls("add_budget"), 1);
        assert_eq!(backend.calls("fetch_budgets"), 1);
        assert_eq!(vm.take_completed(), Some(BudgetAction::Added));
        assert_eq!(vm.take_completed(), None);
    }

    #[tokio::test]
    async fn test_update_budget_calls_once_and_dismisses() {
        let (vm, backend, scope) = setup();
        backend.insert_budget(budget("Food", 100.0, 10.0)).await;

        vm.update_budget(Some("b-food"), "Food", 150.0);
        scope.settle().await;

        assert_eq!(backend.calls("update_budget"), 1);
        assert_eq!(vm.take_completed(), Some(BudgetAction::Updated));
        assert_eq!(vm.state().budgets[0].amount, 150.0);
    }

    #[tokio::test]
    async fn test_update_without_id() {
        let (vm, backend, _scope) = setup();
        vm.update_budget(None, "Food", 150.0);
        assert_eq!(vm.state().error_message.as_deref(), Some("Budget ID is missing"));
        assert_eq!(backend.calls("update_budget"), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_list_untouched() {
        let (vm, backend, scope) = setup();
        backend.insert_budget(budget("Food", 100.0, 10.0)).await;
        vm.refresh_budget_data();
        scope.settle().await;
        backend.reset_calls();

        backend.fail("delete_budget", "");
        vm.delete_budget("b-food");
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.budgets.len(), 1);
        assert!(!state.is_loading);
        assert_eq!(state.error_message.as_deref(), Some("Failed to delete budget"));
        assert_eq!(state.completed, None);
        assert_eq!(backend.calls("fetch_budgets"), 0);
    }

    #[tokio::test]
    async fn test_apply_without_recommendations() {
        let (vm, backend, _scope) = setup();
        assert!(!vm.apply_recommended_budgets());
        assert_eq!(vm.state().error_message.as_deref(), Some("No recommendations to apply"));
        assert_eq!(backend.calls("apply_recommendations"), 0);
    }

    #[tokio::test]
    async fn test_recommendations_then_apply() {
        let (vm, backend, scope) = setup();
        let mut fixed = FixedExpenses::new();
        fixed.insert("Bills".to_string(), 1_000.0);

        vm.fetch_recommendations(10_000.0, fixed);
        scope.settle().await;
        let recommendation = vm.state().recommendation.unwrap();
        assert_eq!(recommendation.strategy, "50/30/20");

        assert!(vm.apply_recommended_budgets());
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.budgets.len(), recommendation.recommendations.len());
        assert_eq!(vm.take_completed(), Some(BudgetAction::RecommendationsApplied));
        assert_eq!(backend.calls("apply_recommendations"), 1);
    }

    #[tokio::test]
    async fn test_network_offline_first_emission_refreshes() {
        let (vm, backend, scope) = setup();
        let (tx, rx) = watch::channel(false);

        vm.watch_network(rx);
        drop(tx);
        scope.settle().await;

        assert!(!vm.state().is_online);
        assert_eq!(backend.calls("fetch_budgets"), 1);
        assert_eq!(backend.calls("sync_local_to_remote"), 0);
    }

    #[tokio::test]
    async fn test_network_online_pushes_local_budgets() {
        let (vm, backend, scope) = setup();
        backend.insert_budget(budget("Food", 100.0, 10.0)).await;
        backend.fail("sync_local_to_remote", "offline queue busy");
        let (tx, rx) = watch::channel(true);

        vm.watch_network(rx);
        drop(tx);
        scope.settle().await;

        let state = vm.state();
        assert!(state.is_online);
        assert_eq!(backend.calls("sync_local_to_remote"), 1);
        assert_eq!(backend.calls("sync_all_budgets"), 1);
        assert_eq!(state.budgets.len(), 1);
        assert_eq!(state.error_message, None);
    }

    #[tokio::test]
    async fn test_clear_data_keeps_month() {
        let (vm, backend, scope) = setup();
        backend.insert_budget(budget("Food", 100.0, 10.0)).await;
        vm.refresh_budget_data();
        scope.settle().await;

        vm.clear_data();
        let state = vm.state();
        assert!(state.budgets.is_empty());
        assert_eq!(state.current_month, "2026-10");
    }

    #[test]
    fn test_progress_clamped() {
        assert_eq!(BudgetViewModel::progress(&budget("Food", 100.0, 250.0)), 1.0);
    }
}
