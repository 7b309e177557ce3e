//! Domain value objects
//!
//! Owned by the use-case layer; state holders keep copies inside their
//! snapshots and only ever replace them whole.

pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod goal;
pub mod liability;
pub mod portfolio;
pub mod transaction;

pub use auth::{CurrencyOption, LoginResult, UpdateProfileRequest, UserProfile};
pub use budget::{
    ApplyRecommendationsRequest, Budget, BudgetCategory, BudgetRecommendation, BudgetSummary,
    FinancialRecommendationResponse, FixedExpenses, NewBudgetRequest, RecommendedBudgetPayload,
};
pub use budget::{month_display, month_key, month_options};
pub use dashboard::{CashflowSummary, ChartBar, ChartTab, SpendingPeriod, SpendingReport};
pub use goal::{
    CreateGoalRequest, Goal, GoalCategory, GoalContribution, GoalProgress, GoalStatus,
    GoalSummary,
};
pub use liability::{
    CategoryBreakdown, CreateInstallmentRequest, CreateLiabilityRequest, CreateLiabilityTransactionRequest,
    CreatePaymentRequest, InterestType, Liability, LiabilityCategory, LiabilityInsight,
    LiabilityPayment, LiabilityQuery, LiabilityStatement, LiabilitySummary,
    LiabilityTransaction, Page, PaymentHistory, PaymentType, PayoffBreakdown,
    SimulatePayoffRequest, SimulatePayoffResponse, SimulationStrategy, UnbilledTransactions,
};
pub use portfolio::{
    Asset, AssetBreakdown, AssetTransaction, AssetTransactionType, AssetType,
    CreateAssetRequest, CreateAssetTransactionRequest, PortfolioSummary, UpdateAssetRequest,
};
pub use transaction::{
    group_by_date, CashflowDateSection, CashflowEntry, CashflowFilter, CashflowType, Transaction,
    TransactionRequest, THIS_MONTH, THIS_YEAR,
};
