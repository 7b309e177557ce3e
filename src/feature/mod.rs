//! Per-screen state holders
//!
//! Each holder owns one `StateContainer` snapshot and runs its intents on the
//! `TaskScope` handed in by the screen. Intents validate locally, flip the
//! loading flag, call the use-case and fold the outcome back into the
//! snapshot. Holders never share state with each other; the only cross-screen
//! signal is `SyncEvents`.

pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod events;
pub mod goal;
pub mod liability;
pub mod portfolio;
pub mod transaction;

pub use auth::{
    ForgotPasswordUiState, ForgotPasswordViewModel, LoginUiState, LoginViewModel,
    RegisterUiState, RegisterViewModel, SetupCurrencyUiState, SetupCurrencyViewModel,
};
pub use budget::{BudgetAction, BudgetUiState, BudgetViewModel};
pub use dashboard::{DashboardUiState, DashboardViewModel};
pub use events::SyncEvents;
pub use goal::{GoalAction, GoalTrackerUiState, GoalTrackerViewModel};
pub use liability::{LiabilityAction, LiabilityUiState, LiabilityViewModel};
pub use portfolio::{PortfolioAction, PortfolioUiState, PortfolioViewModel};
pub use transaction::{TransactionAction, TransactionUiState, TransactionViewModel};
