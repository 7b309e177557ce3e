//! Loans, credit cards and their statements

use crate::cache::{CachedValue, Clock};
use crate::error::{failure_message, CashaError};
use crate::models::{
    CreateInstallmentRequest, CreateLiabilityRequest, CreateLiabilityTransactionRequest,
    CreatePaymentRequest, Liability, LiabilityInsight, LiabilityQuery, LiabilityStatement,
    LiabilitySummary, LiabilityTransaction, Page, PaymentHistory, SimulatePayoffRequest,
    SimulatePayoffResponse, SimulationStrategy, UnbilledTransactions,
};
use crate::scope::TaskScope;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::LiabilityUseCases;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiabilityAction {
    Created,
    PaymentRecorded,
    TransactionAdded,
    InstallmentAdded,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiabilityUiState {
    pub active_liabilities: Vec<Liability>,
    pub paid_off_liabilities: Vec<Liability>,
    pub summary: Option<LiabilitySummary>,
    pub is_loading: bool,
    pub is_summary_loading: bool,
    /// Last successful list or summary load
    pub last_fetched_at: Option<DateTime<Utc>>,

    // ================= Detail =================
    pub latest_statement: Option<LiabilityStatement>,
    pub statements: Vec<LiabilityStatement>,
    pub selected_statement: Option<LiabilityStatement>,
    pub unbilled: Option<UnbilledTransactions>,
    pub insights: Option<LiabilityInsight>,
    pub payment_history: Option<PaymentHistory>,
    pub transactions: Vec<LiabilityTransaction>,
    pub is_detail_loading: bool,

    pub simulation: Option<SimulatePayoffResponse>,
    pub is_simulating: bool,

    pub completed: Option<LiabilityAction>,
    pub error_message: Option<String>,
}

impl LiabilityUiState {
    pub fn total_balance(&self) -> f64 {
        self.active_liabilities.iter().map(|l| l.current_balance).sum()
    }

    pub fn total_monthly_installment(&self) -> f64 {
        self.active_liabilities
            .iter()
            .filter_map(|l| l.monthly_installment)
            .sum()
    }

    pub fn active_count(&self) -> usize {
        self.active_liabilities.len()
    }

    pub fn paid_off_count(&self) -> usize {
        self.paid_off_liabilities.len()
    }

    pub fn overdue_liabilities(&self) -> Vec<&Liability> {
        self.active_liabilities
            .iter()
            .filter(|l| l.is_overdue == Some(true))
            .collect()
    }

    pub fn on_track_liabilities(&self) -> Vec<&Liability> {
        self.active_liabilities
            .iter()
            .filter(|l| l.is_overdue != Some(true))
            .collect()
    }

    fn clear_detail(&mut self) {
        self.latest_statement = None;
        self.statements.clear();
        self.selected_statement = None;
        self.unbilled = None;
        self.insights = None;
        self.payment_history = None;
        self.transactions.clear();
        self.is_detail_loading = false;
    }
}

#[derive(Clone)]
pub struct LiabilityViewModel {
    state: StateContainer<LiabilityUiState>,
    liabilities: Arc<dyn LiabilityUseCases>,
    summary_cache: Arc<CachedValue<LiabilitySummary>>,
    clock: Arc<dyn Clock>,
    scope: TaskScope,
}

impl LiabilityViewModel {
    pub fn new(
        liabilities: Arc<dyn LiabilityUseCases>,
        scope: TaskScope,
        clock: Arc<dyn Clock>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            state: StateContainer::new(LiabilityUiState::default()),
            liabilities,
            summary_cache: Arc::new(CachedValue::new(cache_ttl, clock.clone())),
            clock,
            scope,
        }
    }

    pub fn state(&self) -> LiabilityUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<LiabilityUiState> {
        self.state.subscribe()
    }

    // =============================
    // Lists & Summary
    // =============================

    /// Active (largest balance first) and paid-off liabilities, fetched
    /// concurrently; both must succeed.
    pub fn fetch_all_liabilities(&self) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("fetch_all_liabilities", async move {
            let active_query = LiabilityQuery::active_by_balance();
            let paid_off_query = LiabilityQuery::paid_off();
            let (active, paid_off) = tokio::join!(
                this.liabilities.liabilities(&active_query),
                this.liabilities.liabilities(&paid_off_query),
            );

            match active.and_then(|active| paid_off.map(|paid_off| (active, paid_off))) {
                Ok((active, paid_off)) => {
                    debug!(active = active.len(), paid_off = paid_off.len(), "Liabilities loaded");
                    // Lists and summary share one freshness window
                    this.summary_cache.touch();
                    let fetched_at = this.clock.now();
                    this.state.update(|s| {
                        s.active_liabilities = active;
                        s.paid_off_liabilities = paid_off;
                        s.is_loading = false;
                        s.last_fetched_at = Some(fetched_at);
                    });
                }
                Err(err) => this.fail(&err, "Failed to fetch liabilities"),
            }
        });
    }

    pub fn fetch_liabilities(&self) {
        self.fetch_all_liabilities();
    }

    /// Skipped entirely while the cached summary is fresh, unless `force`
    pub fn fetch_liability_summary(&self, force: bool) {
        if !force {
            if let Some(summary) = self.summary_cache.fresh() {
                debug!("Liability summary still fresh");
                self.state.update(|s| s.summary = Some(summary));
                return;
            }
        }

        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_summary_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("fetch_liability_summary", async move {
            let result = this
                .summary_cache
                .get(force, || this.liabilities.liability_summary())
                .await;
            match result {
                Ok(summary) => {
                    let fetched_at = this.clock.now();
                    this.state.update(|s| {
                        s.summary = Some(summary);
                        s.is_summary_loading = false;
                        s.last_fetched_at = Some(fetched_at);
                    })
                }
                Err(err) => {
                    warn!(error = %err, "Liability summary failed");
                    let message = failure_message(&err, "Failed to fetch liability summary");
                    this.state.update(|s| {
                        s.is_summary_loading = false;
                        s.error_message = Some(message);
                    })
                }
            };
        });
    }

    // =============================
    // Mutations
    // =============================

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
        warn!(error = %err, action = fallback, "Liability action failed");
        let message = failure_message(err, fallback);
        self.state.update(|s| {
            s.is_loading = false;
            s.error_message = Some(message);
        });
    }

    /// Lists and the summary must reflect the mutation just applied
    fn succeed(&self, action: LiabilityAction) {
        self.state.update(|s| {
            s.is_loading = false;
            s.completed = Some(action);
        });
        self.fetch_all_liabilities();
        self.fetch_liability_summary(true);
    }

    pub fn create_liability(&self, request: CreateLiabilityRequest) {
        if request.name.trim().is_empty() {
            return self.reject("Please enter liability name");
        }
        if !request.interest_rate.is_finite() || request.interest_rate < 0.0 {
            return self.reject("Please enter a valid interest rate");
        }

        self.start_loading();
        let this = self.clone();
        self.scope.launch("create_liability", async move {
            match this.liabilities.create_liability(request).await {
                Ok(liability) => {
                    info!(liability_id = %liability.id, category = ?liability.category, "Liability created");
                    this.succeed(LiabilityAction::Created);
                }
                Err(err) => this.fail(&err, "Failed to create liability"),
            }
        });
    }

    pub fn record_payment(&self, liability_id: &str, request: CreatePaymentRequest) {
        if request.amount <= 0.0 {
            return self.reject("Amount must be greater than 0");
        }

        self.start_loading();
        let liability_id = liability_id.to_string();
        let this = self.clone();
        self.scope.launch("record_payment", async move {
            match this.liabilities.record_payment(&liability_id, request).await {
                Ok(payment) => {
                    info!(liability_id = %liability_id, amount = payment.amount, "Payment recorded");
                    this.succeed(LiabilityAction::PaymentRecorded);
                }
                Err(err) => this.fail(&err, "Failed to record payment"),
            }
        });
    }

    pub fn create_transaction(&self, liability_id: &str, request: CreateLiabilityTransactionRequest) {
        if request.name.trim().is_empty() {
            return self.reject("Please enter transaction name");
        }
        if request.amount <= 0.0 {
            return self.reject("Amount must be greater than 0");
        }

        self.start_loading();
        let liability_id = liability_id.to_string();
        let this = self.clone();
        self.scope.launch("create_transaction", async move {
            match this.liabilities.create_transaction(&liability_id, request).await {
                Ok(transaction) => {
                    info!(liability_id = %liability_id, transaction_id = %transaction.id, "Transaction added");
                    this.succeed(LiabilityAction::TransactionAdded);
                    this.fetch_unbilled_transactions(&liability_id);
                }
                Err(err) => this.fail(&err, "Failed to add transaction"),
            }
        });
    }

    pub fn add_installment(&self, liability_id: &str, request: CreateInstallmentRequest) {
        if request.name.trim().is_empty() {
            return self.reject("Please fill in all fields");
        }

        self.start_loading();
        let liability_id = liability_id.to_string();
        let this = self.clone();
        self.scope.launch("add_installment", async move {
            match this.liabilities.add_installment(&liability_id, request).await {
                Ok(_) => {
                    info!(liability_id = %liability_id, "Installment added");
                    this.succeed(LiabilityAction::InstallmentAdded);
                }
                Err(err) => this.fail(&err, "Failed to add installment"),
            }
        });
    }

    pub fn delete_liability(&self, liability_id: &str) {
        self.start_loading();
        let liability_id = liability_id.to_string();
        let this = self.clone();
        self.scope.launch("delete_liability", async move {
            match this.liabilities.delete_liability(&liability_id).await {
                Ok(()) => {
                    info!(liability_id = %liability_id, "Liability deleted");
                    this.state.update(|s| s.clear_detail());
                    this.succeed(LiabilityAction::Deleted);
                }
                Err(err) => this.fail(&err, "Failed to delete liability"),
            }
        });
    }

    // =============================
    // Detail Screens
    // =============================

    fn load_detail<T, F, Fut, A>(&self, label: &'static str, fallback: &'static str, call: F, apply: A)
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn LiabilityUseCases>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        A: FnOnce(&mut LiabilityUiState, T) + Send + 'static,
    {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_detail_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch(label, async move {
            match call(Arc::clone(&this.liabilities)).await {
                Ok(value) => {
                    this.state.update(move |s| {
                        apply(s, value);
                        s.is_detail_loading = false;
                    });
                }
                Err(err) => {
                    warn!(error = %err, task = label, "Liability detail failed");
                    let message = failure_message(&err, fallback);
                    this.state.update(|s| {
                        s.is_detail_loading = false;
                        s.error_message = Some(message);
                    });
                }
            }
        });
    }

    pub fn fetch_latest_statement(&self, liability_id: &str) {
        let id = liability_id.to_string();
        self.load_detail(
            "fetch_latest_statement",
            "Failed to fetch statement",
            move |uc| async move { uc.latest_statement(&id).await },
            |s, statement| s.latest_statement = statement,
        );
    }

    pub fn fetch_all_statements(&self, liability_id: &str) {
        let id = liability_id.to_string();
        self.load_detail(
            "fetch_all_statements",
            "Failed to fetch statements",
            move |uc| async move { uc.statements(&id).await },
            |s, statements| s.statements = statements,
        );
    }

    pub fn fetch_statement_details(&self, liability_id: &str, statement_id: &str) {
        let id = liability_id.to_string();
        let statement_id = statement_id.to_string();
        self.load_detail(
            "fetch_statement_details",
            "Failed to fetch statement details",
            move |uc| async move { uc.statement_details(&id, &statement_id).await },
            |s, statement| s.selected_statement = Some(statement),
        );
    }

    pub fn fetch_unbilled_transactions(&self, liability_id: &str) {
        let id = liability_id.to_string();
        self.load_detail(
            "fetch_unbilled_transactions",
            "Failed to fetch unbilled transactions",
            move |uc| async move { uc.unbilled_transactions(&id).await },
            |s, unbilled| s.unbilled = Some(unbilled),
        );
    }

    pub fn fetch_liability_insights(&self, liability_id: &str) {
        let id = liability_id.to_string();
        self.load_detail(
            "fetch_liability_insights",
            "Failed to fetch insights",
            move |uc| async move { uc.insights(&id).await },
            |s, insights| s.insights = Some(insights),
        );
    }

    pub fn fetch_payment_history(&self, liability_id: &str, page: Page) {
        let id = liability_id.to_string();
        self.load_detail(
            "fetch_payment_history",
            "Failed to fetch payment history",
            move |uc| async move { uc.payment_history(&id, page).await },
            |s, history| s.payment_history = Some(history),
        );
    }

    pub fn fetch_transactions(&self, liability_id: &str, page: Page) {
        let id = liability_id.to_string();
        self.load_detail(
            "fetch_transactions",
            "Failed to fetch transactions",
            move |uc| async move { uc.transactions(&id, page).await },
            |s, transactions| s.transactions = transactions,
        );
    }

    /// Drops the previous projection before asking for a new one. A
    /// non-positive extra payment is sent as none.
    pub fn simulate_payoff(&self, strategy: SimulationStrategy, additional_payment: Option<f64>) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.simulation = None;
            s.is_simulating = true;
            s.error_message = None;
        });

        let request = SimulatePayoffRequest {
            strategy,
            additional_payment: additional_payment.filter(|amount| *amount > 0.0),
        };
        let this = self.clone();
        self.scope.launch("simulate_payoff", async move {
            match this.liabilities.simulate_payoff(request).await {
                Ok(simulation) => {
                    debug!(months = simulation.total_months_to_pay_off, "Payoff simulated");
                    this.state.update(|s| {
                        s.simulation = Some(simulation);
                        s.is_simulating = false;
                    });
                }
                Err(err) => {
                    warn!(error = %err, "Payoff simulation failed");
                    let message = failure_message(&err, "Failed to run simulation");
                    this.state.update(|s| {
                        s.is_simulating = false;
                        s.error_message = Some(message);
                    });
                }
            }
        });
    }

    pub fn take_completed(&self) -> Option<LiabilityAction> {
        let mut taken = None;
        self.state.update(|s| taken = s.completed.take());
        taken
    }

    pub fn clear_detail_state(&self) {
        self.state.update(|s| s.clear_detail());
    }

    /// Forget everything, including the cached summary
    pub fn clear_data(&self) {
        self.summary_cache.invalidate();
        self.state.replace(LiabilityUiState::default());
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error_message = None);
    }
}
