//! Use-case collaborators
//!
//! State holders treat every call here as an opaque, possibly failing,
//! possibly suspending operation. A failure carries a message meant for
//! direct display (`CashaError::Remote`) or none at all.

mod memory;

pub use memory::InMemoryBackend;

use crate::models::*;
use crate::Result;
use chrono::NaiveDate;

#[async_trait::async_trait]
pub trait AuthUseCases: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult>;
    async fn google_login(&self, id_token: &str) -> Result<LoginResult>;
    /// Returns the access token of the new account
    async fn register(&self, name: &str, email: &str, phone: &str, password: &str)
        -> Result<String>;
    async fn reset_password(&self, email: &str) -> Result<()>;
}

#[async_trait::async_trait]
pub trait ProfileUseCases: Send + Sync {
    async fn profile(&self) -> Result<UserProfile>;
    async fn update_profile(&self, request: UpdateProfileRequest) -> Result<()>;
}

#[async_trait::async_trait]
pub trait BudgetUseCases: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<BudgetCategory>>;
    /// Pull the remote budgets of `month` into local storage
    async fn sync_all_budgets(&self, month: &str) -> Result<()>;
    /// Locally stored budgets of `month`
    async fn fetch_budgets(&self, month: &str) -> Result<Vec<Budget>>;
    async fn budget_summary(&self, month: &str) -> Result<BudgetSummary>;
    fn calculate_local_summary(&self, budgets: &[Budget]) -> BudgetSummary;
    async fn add_budget(&self, request: NewBudgetRequest) -> Result<Budget>;
    async fn update_budget(&self, id: &str, request: NewBudgetRequest) -> Result<Budget>;
    async fn delete_budget(&self, id: &str) -> Result<()>;
    async fn recommendations(
        &self,
        monthly_income: f64,
        fixed_expenses: &FixedExpenses,
    ) -> Result<FinancialRecommendationResponse>;
    async fn apply_recommendations(&self, request: ApplyRecommendationsRequest) -> Result<()>;
    /// Push budgets created or edited offline
    async fn sync_local_to_remote(&self) -> Result<()>;
}

#[async_trait::async_trait]
pub trait TransactionUseCases: Send + Sync {
    /// Remote income and expense history inside `filter`, newest first
    async fn cashflow_history(&self, filter: &CashflowFilter, page: Page)
        -> Result<Vec<CashflowEntry>>;
    /// Locally stored transactions, synced or not
    async fn transactions(&self) -> Result<Vec<Transaction>>;
    async fn add_transaction(&self, request: TransactionRequest) -> Result<Transaction>;
    async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction>;
    async fn delete_transaction(&self, id: &str) -> Result<()>;
    /// Push unsynced local transactions and pull remote ones
    async fn sync_transactions(&self) -> Result<()>;
    async fn transaction_categories(&self) -> Result<Vec<BudgetCategory>>;
}

#[async_trait::async_trait]
pub trait DashboardUseCases: Send + Sync {
    async fn total_spending(&self, filter: &CashflowFilter) -> Result<f64>;
    async fn spending_report(&self, today: NaiveDate) -> Result<SpendingReport>;
    async fn unsynced_count(&self) -> Result<usize>;
    async fn cashflow_summary(&self, filter: &CashflowFilter) -> Result<CashflowSummary>;
    /// Same aggregate computed from local data only
    async fn local_cashflow_summary(&self, filter: &CashflowFilter) -> Result<CashflowSummary>;
    /// Refresh local cashflow storage from the remote history
    async fn sync_cashflow(&self) -> Result<()>;
}

#[async_trait::async_trait]
pub trait GoalUseCases: Send + Sync {
    async fn goals(&self) -> Result<Vec<Goal>>;
    async fn goal_summary(&self) -> Result<GoalSummary>;
    async fn goal_categories(&self) -> Result<Vec<GoalCategory>>;
    async fn goal(&self, id: &str) -> Result<Goal>;
    async fn create_goal(&self, request: CreateGoalRequest) -> Result<Goal>;
    async fn update_goal(&self, id: &str, request: CreateGoalRequest) -> Result<Goal>;
    async fn delete_goal(&self, id: &str) -> Result<()>;
    async fn add_contribution(
        &self,
        goal_id: &str,
        amount: f64,
        note: Option<String>,
    ) -> Result<GoalContribution>;
}

#[async_trait::async_trait]
pub trait LiabilityUseCases: Send + Sync {
    async fn liabilities(&self, query: &LiabilityQuery) -> Result<Vec<Liability>>;
    async fn liability_summary(&self) -> Result<LiabilitySummary>;
    async fn create_liability(&self, request: CreateLiabilityRequest) -> Result<Liability>;
    async fn record_payment(&self, liability_id: &str, request: CreatePaymentRequest)
        -> Result<LiabilityPayment>;
    async fn latest_statement(&self, liability_id: &str) -> Result<Option<LiabilityStatement>>;
    async fn statements(&self, liability_id: &str) -> Result<Vec<LiabilityStatement>>;
    async fn statement_details(&self, liability_id: &str, statement_id: &str)
        -> Result<LiabilityStatement>;
    async fn unbilled_transactions(&self, liability_id: &str) -> Result<UnbilledTransactions>;
    async fn insights(&self, liability_id: &str) -> Result<LiabilityInsight>;
    async fn payment_history(&self, liability_id: &str, page: Page) -> Result<PaymentHistory>;
    async fn transactions(&self, liability_id: &str, page: Page)
        -> Result<Vec<LiabilityTransaction>>;
    async fn create_transaction(
        &self,
        liability_id: &str,
        request: CreateLiabilityTransactionRequest,
    ) -> Result<LiabilityTransaction>;
    async fn add_installment(&self, liability_id: &str, request: CreateInstallmentRequest)
        -> Result<LiabilityTransaction>;
    async fn simulate_payoff(&self, request: SimulatePayoffRequest)
        -> Result<SimulatePayoffResponse>;
    async fn delete_liability(&self, liability_id: &str) -> Result<()>;
}

#[async_trait::async_trait]
pub trait PortfolioUseCases: Send + Sync {
    async fn assets(&self) -> Result<Vec<Asset>>;
    async fn portfolio_summary(&self) -> Result<PortfolioSummary>;
    async fn create_asset(&self, request: CreateAssetRequest) -> Result<Asset>;
    async fn update_asset(&self, id: &str, request: UpdateAssetRequest) -> Result<Asset>;
    async fn delete_asset(&self, id: &str) -> Result<()>;
    async fn add_asset_transaction(
        &self,
        asset_id: &str,
        request: CreateAssetTransactionRequest,
    ) -> Result<AssetTransaction>;
    async fn asset_transactions(&self, asset_id: &str) -> Result<Vec<AssetTransaction>>;
    /// Total spending recorded against the account
    async fn total_expenses(&self) -> Result<f64>;
}
