//! In-memory backend
//!
//! Implements every use-case trait over process-local collections. Used by
//! the demo binary and by tests, which spy on it through the per-operation
//! call log and arm failures with `fail`.

use super::{
    AuthUseCases, BudgetUseCases, DashboardUseCases, GoalUseCases, LiabilityUseCases,
    PortfolioUseCases, ProfileUseCases, TransactionUseCases,
};
use crate::config::DEFAULT_CURRENCY;
use crate::error::CashaError;
use crate::models::*;
use crate::Result;
use chrono::{Duration as Days, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Upper bound of a payoff projection (50 years)
const MAX_PAYOFF_MONTHS: u32 = 600;
const MIN_PAYMENT_RATE: f64 = 0.05;
const RECENT_CONTRIBUTIONS: usize = 5;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    currency: Option<String>,
}

#[derive(Debug, Default)]
struct Store {
    accounts: HashMap<String, Account>,
    profile: Option<UpdateProfileRequest>,
    budget_categories: Vec<BudgetCategory>,
    budgets: Vec<Budget>,
    goal_categories: Vec<GoalCategory>,
    goals: Vec<Goal>,
    liabilities: Vec<Liability>,
    payments: Vec<LiabilityPayment>,
    liability_transactions: Vec<LiabilityTransaction>,
    statements: Vec<LiabilityStatement>,
    assets: Vec<Asset>,
    asset_transactions: Vec<AssetTransaction>,
    total_expenses: f64,
    transactions: Vec<Transaction>,
    incomes: Vec<CashflowEntry>,
}

/// Development backend with call spying and failure injection
#[derive(Clone)]
pub struct InMemoryBackend {
    currency: String,
    store: Arc<RwLock<Store>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
    failures: Arc<Mutex<HashMap<String, String>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn budget_category(name: &str, is_active: bool) -> BudgetCategory {
    BudgetCategory {
        id: new_id(),
        name: name.to_string(),
        is_active,
    }
}

fn goal_category(name: &str, icon: &str, color: &str) -> GoalCategory {
    GoalCategory {
        id: new_id(),
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        is_active: true,
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

impl InMemoryBackend {
    pub fn new(currency: impl Into<String>) -> Self {
        let store = Store {
            budget_categories: vec![
                budget_category("Food", true),
                budget_category("Transport", true),
                budget_category("Shopping", true),
                budget_category("Bills", true),
                budget_category("Entertainment", true),
                budget_category("Legacy", false),
            ],
            goal_categories: vec![
                goal_category("Emergency Fund", "shield", "#2E7D32"),
                goal_category("Vacation", "plane", "#0277BD"),
                goal_category("Gadget", "phone", "#6A1B9A"),
                goal_category("Education", "book", "#EF6C00"),
            ],
            ..Store::default()
        };

        Self {
            currency: currency.into(),
            store: Arc::new(RwLock::new(store)),
            calls: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    // =============================
    // Spying & Failure Injection
    // =============================

    /// Number of times `op` has been invoked
    pub fn calls(&self, op: &str) -> usize {
        lock(&self.calls).get(op).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Fail every call of `op` until `recover`. A blank message fails without
    /// any message.
    pub fn fail(&self, op: &str, message: &str) {
        lock(&self.failures).insert(op.to_string(), message.to_string());
    }

    pub fn recover(&self, op: &str) {
        lock(&self.failures).remove(op);
    }

    /// Suspend every call of `op` for `delay` before answering
    pub fn delay(&self, op: &str, delay: Duration) {
        lock(&self.delays).insert(op.to_string(), delay);
    }

    fn record(&self, op: &'static str) {
        *lock(&self.calls).entry(op.to_string()).or_insert(0) += 1;
        debug!(op, "Backend call");
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        self.record(op);

        let delay = lock(&self.delays).get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = lock(&self.failures).get(op).cloned();
        match failure {
            Some(message) if message.trim().is_empty() => Err(CashaError::Unavailable),
            Some(message) => Err(CashaError::Remote(message)),
            None => Ok(()),
        }
    }

    // =============================
    // Seeding
    // =============================

    pub async fn add_account(&self, email: &str, password: &str, currency: Option<&str>) {
        self.store.write().await.accounts.insert(
            email.trim().to_lowercase(),
            Account {
                password: password.to_string(),
                currency: currency.map(str::to_string),
            },
        );
    }

    pub async fn insert_budget(&self, budget: Budget) {
        self.store.write().await.budgets.push(budget);
    }

    pub async fn insert_liability(&self, liability: Liability) {
        self.store.write().await.liabilities.push(liability);
    }

    pub async fn insert_statement(&self, statement: LiabilityStatement) {
        self.store.write().await.statements.push(statement);
    }

    pub async fn insert_asset(&self, asset: Asset) {
        self.store.write().await.assets.push(asset);
    }

    pub async fn insert_transaction(&self, transaction: Transaction) {
        self.store.write().await.transactions.push(transaction);
    }

    pub async fn insert_income(&self, income: CashflowEntry) {
        self.store.write().await.incomes.push(income);
    }

    pub async fn set_total_expenses(&self, total: f64) {
        self.store.write().await.total_expenses = total;
    }

    pub async fn stored_profile(&self) -> Option<UpdateProfileRequest> {
        self.store.read().await.profile.clone()
    }

    pub async fn stored_budgets(&self) -> Vec<Budget> {
        self.store.read().await.budgets.clone()
    }
}

// ================= Auth =================

#[async_trait::async_trait]
impl AuthUseCases for InMemoryBackend {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult> {
        self.enter("login").await?;
        let store = self.store.read().await;
        match store.accounts.get(&email.trim().to_lowercase()) {
            Some(account) if account.password == password => Ok(LoginResult {
                token: new_id(),
                currency: account.currency.clone(),
            }),
            _ => Err(CashaError::remote("Invalid email or password")),
        }
    }

    async fn google_login(&self, id_token: &str) -> Result<LoginResult> {
        self.enter("google_login").await?;
        if id_token.trim().is_empty() {
            return Err(CashaError::remote("Invalid Google credential"));
        }
        Ok(LoginResult {
            token: new_id(),
            currency: None,
        })
    }

    async fn register(&self, _name: &str, email: &str, _phone: &str, password: &str)
        -> Result<String> {
        self.enter("register").await?;
        let key = email.trim().to_lowercase();
        let mut store = self.store.write().await;
        if store.accounts.contains_key(&key) {
            return Err(CashaError::remote("Email is already registered"));
        }
        store.accounts.insert(
            key,
            Account {
                password: password.to_string(),
                currency: None,
            },
        );
        Ok(new_id())
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        self.enter("reset_password").await?;
        let store = self.store.read().await;
        if !store.accounts.contains_key(&email.trim().to_lowercase()) {
            return Err(CashaError::remote("No account found with that email"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProfileUseCases for InMemoryBackend {
    async fn profile(&self) -> Result<UserProfile> {
        self.enter("profile").await?;
        let store = self.store.read().await;
        let profile = store
            .profile
            .as_ref()
            .ok_or_else(|| CashaError::NotFound("profile".to_string()))?;
        Ok(UserProfile {
            email: profile.email.clone().unwrap_or_default(),
            name: profile.name.clone().unwrap_or_default(),
            currency: profile
                .currency
                .clone()
                .unwrap_or_else(|| self.currency.clone()),
        })
    }

    async fn update_profile(&self, request: UpdateProfileRequest) -> Result<()> {
        self.enter("update_profile").await?;
        self.store.write().await.profile = Some(request);
        Ok(())
    }
}

// ================= Budget =================

fn parse_display_month(display: &str) -> Option<String> {
    NaiveDate::parse_from_str(&format!("1 {}", display.trim()), "%d %B %Y")
        .ok()
        .map(month_key)
}

#[async_trait::async_trait]
impl BudgetUseCases for InMemoryBackend {
    async fn fetch_categories(&self) -> Result<Vec<BudgetCategory>> {
        self.enter("fetch_categories").await?;
        Ok(self.store.read().await.budget_categories.clone())
    }

    async fn sync_all_budgets(&self, _month: &str) -> Result<()> {
        self.enter("sync_all_budgets").await
    }

    async fn fetch_budgets(&self, month: &str) -> Result<Vec<Budget>> {
        self.enter("fetch_budgets").await?;
        let store = self.store.read().await;
        Ok(store
            .budgets
            .iter()
            .filter(|b| b.period == month)
            .cloned()
            .collect())
    }

    async fn budget_summary(&self, month: &str) -> Result<BudgetSummary> {
        self.enter("budget_summary").await?;
        let store = self.store.read().await;
        let budgets: Vec<Budget> = store
            .budgets
            .iter()
            .filter(|b| b.period == month)
            .cloned()
            .collect();
        Ok(BudgetSummary::from_budgets(&budgets, &self.currency))
    }

    fn calculate_local_summary(&self, budgets: &[Budget]) -> BudgetSummary {
        self.record("calculate_local_summary");
        BudgetSummary::from_budgets(budgets, &self.currency)
    }

    async fn add_budget(&self, request: NewBudgetRequest) -> Result<Budget> {
        self.enter("add_budget").await?;
        if request.amount <= 0.0 {
            return Err(CashaError::remote("Amount must be greater than 0"));
        }

        let mut store = self.store.write().await;
        if store
            .budgets
            .iter()
            .any(|b| b.period == request.month && b.category == request.category)
        {
            return Err(CashaError::remote("Budget for this category already exists"));
        }

        let budget = Budget {
            id: request.id.unwrap_or_else(new_id),
            amount: request.amount,
            spent: 0.0,
            remaining: request.amount,
            period: request.month,
            category: request.category,
            currency: self.currency.clone(),
            is_synced: true,
            updated_at: Utc::now(),
        };
        store.budgets.push(budget.clone());
        Ok(budget)
    }

    async fn update_budget(&self, id: &str, request: NewBudgetRequest) -> Result<Budget> {
        self.enter("update_budget").await?;
        if request.amount <= 0.0 {
            return Err(CashaError::remote("Amount must be greater than 0"));
        }

        let mut store = self.store.write().await;
        let budget = store
            .budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| CashaError::NotFound(format!("budget {}", id)))?;
        budget.amount = request.amount;
        budget.remaining = request.amount - budget.spent;
        budget.category = request.category;
        budget.period = request.month;
        budget.updated_at = Utc::now();
        Ok(budget.clone())
    }

    async fn delete_budget(&self, id: &str) -> Result<()> {
        self.enter("delete_budget").await?;
        let mut store = self.store.write().await;
        let before = store.budgets.len();
        store.budgets.retain(|b| b.id != id);
        if store.budgets.len() == before {
            return Err(CashaError::NotFound(format!("budget {}", id)));
        }
        Ok(())
    }

    async fn recommendations(
        &self,
        monthly_income: f64,
        fixed_expenses: &FixedExpenses,
    ) -> Result<FinancialRecommendationResponse> {
        self.enter("recommendations").await?;
        if monthly_income <= 0.0 {
            return Err(CashaError::remote("Monthly income must be greater than 0"));
        }

        let needs = monthly_income * 0.5;
        let wants = monthly_income * 0.3;
        let savings = monthly_income * 0.2;
        let fixed_total: f64 = fixed_expenses.values().sum();

        let mut recommendations: Vec<BudgetRecommendation> = fixed_expenses
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(category, amount)| BudgetRecommendation {
                id: new_id(),
                category: category.clone(),
                suggested_amount: *amount,
                reasoning: "Fixed monthly expense".to_string(),
            })
            .collect();

        let flexible_needs = (needs - fixed_total).max(0.0);
        let suggestions = [
            ("Food", flexible_needs, "Essentials left after fixed expenses"),
            ("Entertainment", wants * 0.5, "Half of the wants allocation"),
            ("Shopping", wants * 0.5, "Half of the wants allocation"),
            ("Savings", savings, "Pay yourself first"),
        ];
        for (category, amount, reasoning) in suggestions {
            if amount > 0.0 && !fixed_expenses.contains_key(category) {
                recommendations.push(BudgetRecommendation {
                    id: new_id(),
                    category: category.to_string(),
                    suggested_amount: amount,
                    reasoning: reasoning.to_string(),
                });
            }
        }

        let mut insights = Vec::new();
        if fixed_total > needs {
            insights.push("Fixed expenses exceed 50% of your income".to_string());
        } else {
            insights.push(format!(
                "You can save {:.0} {} every month",
                savings, self.currency
            ));
        }

        Ok(FinancialRecommendationResponse {
            strategy: "50/30/20".to_string(),
            needs_percentage: 50,
            wants_percentage: 30,
            savings_percentage: 20,
            insights,
            recommendations,
        })
    }

    async fn apply_recommendations(&self, request: ApplyRecommendationsRequest) -> Result<()> {
        self.enter("apply_recommendations").await?;
        let period = parse_display_month(&request.month)
            .ok_or_else(|| CashaError::remote(format!("Invalid month: {}", request.month)))?;

        let mut store = self.store.write().await;
        for payload in request.budgets.into_iter().filter(|p| p.amount > 0.0) {
            let existing = store
                .budgets
                .iter_mut()
                .find(|b| b.period == period && b.category == payload.category);
            match existing {
                Some(budget) => {
                    budget.amount = payload.amount;
                    budget.remaining = payload.amount - budget.spent;
                    budget.updated_at = Utc::now();
                }
                None => store.budgets.push(Budget {
                    id: new_id(),
                    amount: payload.amount,
                    spent: 0.0,
                    remaining: payload.amount,
                    period: period.clone(),
                    category: payload.category,
                    currency: self.currency.clone(),
                    is_synced: true,
                    updated_at: Utc::now(),
                }),
            }
        }
        Ok(())
    }

    async fn sync_local_to_remote(&self) -> Result<()> {
        self.enter("sync_local_to_remote").await?;
        for budget in self.store.write().await.budgets.iter_mut() {
            budget.is_synced = true;
        }
        Ok(())
    }
}

// ================= Goals =================

fn refresh_progress(goal: &mut Goal, today: NaiveDate) {
    let remaining = (goal.target_amount - goal.current_amount).max(0.0);
    let days_remaining = goal.deadline.map(|d| (d - today).num_days());
    let monthly_savings_needed = days_remaining.and_then(|days| {
        if remaining <= 0.0 {
            return None;
        }
        let months = ((days.max(0) as f64) / 30.0).ceil().max(1.0);
        Some(remaining / months)
    });

    goal.progress = GoalProgress {
        percentage: if goal.target_amount > 0.0 {
            (goal.current_amount / goal.target_amount * 100.0).min(100.0)
        } else {
            0.0
        },
        days_remaining,
        monthly_savings_needed,
    };

    if goal.current_amount >= goal.target_amount && goal.status == GoalStatus::Active {
        goal.status = GoalStatus::Completed;
    }
}

fn validate_goal(request: &CreateGoalRequest) -> Result<()> {
    if request.name.trim().is_empty() {
        return Err(CashaError::remote("Goal name is required"));
    }
    if request.target_amount <= 0.0 {
        return Err(CashaError::remote("Target amount must be greater than 0"));
    }
    Ok(())
}

#[async_trait::async_trait]
impl GoalUseCases for InMemoryBackend {
    async fn goals(&self) -> Result<Vec<Goal>> {
        self.enter("goals").await?;
        Ok(self.store.read().await.goals.clone())
    }

    async fn goal_summary(&self) -> Result<GoalSummary> {
        self.enter("goal_summary").await?;
        let store = self.store.read().await;
        let goals = &store.goals;

        let total_target: f64 = goals.iter().map(|g| g.target_amount).sum();
        let total_current: f64 = goals.iter().map(|g| g.current_amount).sum();
        let nearest_deadline = goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .filter_map(|g| g.deadline.map(|d| (g.name.clone(), d)))
            .min_by_key(|(_, deadline)| *deadline);

        Ok(GoalSummary {
            total_goals: goals.len(),
            active_goals: goals.iter().filter(|g| g.status == GoalStatus::Active).count(),
            completed_goals: goals
                .iter()
                .filter(|g| g.status == GoalStatus::Completed)
                .count(),
            total_target,
            total_current,
            overall_progress: if total_target > 0.0 {
                total_current / total_target * 100.0
            } else {
                0.0
            },
            nearest_deadline,
        })
    }

    async fn goal_categories(&self) -> Result<Vec<GoalCategory>> {
        self.enter("goal_categories").await?;
        Ok(self.store.read().await.goal_categories.clone())
    }

    async fn goal(&self, id: &str) -> Result<Goal> {
        self.enter("goal").await?;
        self.store
            .read()
            .await
            .goals
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| CashaError::NotFound(format!("goal {}", id)))
    }

    async fn create_goal(&self, request: CreateGoalRequest) -> Result<Goal> {
        self.enter("create_goal").await?;
        validate_goal(&request)?;

        let mut goal = Goal {
            id: new_id(),
            name: request.name.trim().to_string(),
            target_amount: request.target_amount,
            current_amount: 0.0,
            currency: self.currency.clone(),
            category: request.category,
            icon: request.icon,
            color: request.color,
            deadline: request.deadline,
            status: GoalStatus::Active,
            asset_id: request.asset_id,
            note: request.note,
            progress: GoalProgress {
                percentage: 0.0,
                days_remaining: None,
                monthly_savings_needed: None,
            },
            recent_contributions: Vec::new(),
        };
        refresh_progress(&mut goal, Utc::now().date_naive());

        self.store.write().await.goals.push(goal.clone());
        Ok(goal)
    }

    async fn update_goal(&self, id: &str, request: CreateGoalRequest) -> Result<Goal> {
        self.enter("update_goal").await?;
        validate_goal(&request)?;

        let mut store = self.store.write().await;
        let goal = store
            .goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| CashaError::NotFound(format!("goal {}", id)))?;
        goal.name = request.name.trim().to_string();
        goal.target_amount = request.target_amount;
        goal.category = request.category;
        goal.deadline = request.deadline;
        goal.asset_id = request.asset_id;
        goal.icon = request.icon;
        goal.color = request.color;
        goal.note = request.note;
        if goal.status == GoalStatus::Completed && goal.current_amount < goal.target_amount {
            goal.status = GoalStatus::Active;
        }
        refresh_progress(goal, Utc::now().date_naive());
        Ok(goal.clone())
    }

    async fn delete_goal(&self, id: &str) -> Result<()> {
        self.enter("delete_goal").await?;
        let mut store = self.store.write().await;
        let before = store.goals.len();
        store.goals.retain(|g| g.id != id);
        if store.goals.len() == before {
            return Err(CashaError::NotFound(format!("goal {}", id)));
        }
        Ok(())
    }

    async fn add_contribution(
        &self,
        goal_id: &str,
        amount: f64,
        note: Option<String>,
    ) -> Result<GoalContribution> {
        self.enter("add_contribution").await?;
        if amount <= 0.0 {
            return Err(CashaError::remote("Amount must be greater than 0"));
        }

        let mut store = self.store.write().await;
        let goal = store
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| CashaError::NotFound(format!("goal {}", goal_id)))?;

        let contribution = GoalContribution {
            id: new_id(),
            goal_id: goal_id.to_string(),
            amount,
            note,
            datetime: Utc::now(),
        };
        goal.current_amount += amount;
        goal.recent_contributions.insert(0, contribution.clone());
        goal.recent_contributions.truncate(RECENT_CONTRIBUTIONS);
        refresh_progress(goal, Utc::now().date_naive());
        Ok(contribution)
    }
}

// ================= Liabilities =================

fn monthly_rate(liability: &Liability) -> f64 {
    match liability.interest_type {
        Some(InterestType::Monthly) => liability.interest_rate / 100.0,
        _ => liability.interest_rate / 100.0 / 12.0,
    }
}

fn minimum_payment(liability: &Liability) -> f64 {
    match liability.monthly_installment {
        Some(installment) if installment > 0.0 => installment,
        _ => (liability.current_balance * MIN_PAYMENT_RATE).max(1.0),
    }
}

fn paged<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    items
        .iter()
        .skip(page.offset())
        .take(page.page_size as usize)
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
struct Debt {
    id: String,
    name: String,
    balance: f64,
    rate: f64,
    minimum: f64,
}

#[derive(Debug, Clone, Default)]
struct Projection {
    months: u32,
    total_paid: f64,
    total_interest: f64,
    per_debt: Vec<(u32, f64)>,
}

/// Month-by-month payoff. With `rollover`, the extra payment plus every freed
/// minimum goes to the first unpaid debt in `debts` order.
fn project_payoff(debts: &[Debt], additional: f64, rollover: bool) -> Projection {
    let mut balances: Vec<f64> = debts.iter().map(|d| d.balance).collect();
    let mut per_debt = vec![(0u32, 0.0f64); debts.len()];
    let monthly_budget: f64 = debts.iter().map(|d| d.minimum).sum::<f64>() + additional;
    let mut projection = Projection::default();

    for month in 1..=MAX_PAYOFF_MONTHS {
        if balances.iter().all(|b| *b <= 0.005) {
            break;
        }
        projection.months = month;

        for (i, debt) in debts.iter().enumerate() {
            if balances[i] > 0.005 {
                let interest = balances[i] * debt.rate;
                balances[i] += interest;
                per_debt[i].1 += interest;
                projection.total_interest += interest;
            }
        }

        let mut budget = monthly_budget;
        for (i, debt) in debts.iter().enumerate() {
            if balances[i] > 0.005 {
                let paid = debt.minimum.min(balances[i]);
                balances[i] -= paid;
                budget -= paid;
                projection.total_paid += paid;
            }
        }

        if rollover {
            for balance in balances.iter_mut() {
                if budget <= 0.0 {
                    break;
                }
                if *balance > 0.005 {
                    let paid = budget.min(*balance);
                    *balance -= paid;
                    budget -= paid;
                    projection.total_paid += paid;
                }
            }
        }

        for (i, balance) in balances.iter().enumerate() {
            if *balance <= 0.005 && per_debt[i].0 == 0 {
                per_debt[i].0 = month;
            }
        }
    }

    for (i, balance) in balances.iter().enumerate() {
        if *balance > 0.005 {
            per_debt[i].0 = MAX_PAYOFF_MONTHS;
        }
    }
    projection.per_debt = per_debt;
    projection
}

#[async_trait::async_trait]
impl LiabilityUseCases for InMemoryBackend {
    async fn liabilities(&self, query: &LiabilityQuery) -> Result<Vec<Liability>> {
        self.enter("liabilities").await?;
        let store = self.store.read().await;
        let mut liabilities: Vec<Liability> = store
            .liabilities
            .iter()
            .filter(|l| query.status.as_deref().map_or(true, |s| l.status == s))
            .cloned()
            .collect();

        match query.sort_by.as_deref() {
            Some("balance") => {
                liabilities.sort_by(|a, b| a.current_balance.total_cmp(&b.current_balance))
            }
            Some("interest_rate") => {
                liabilities.sort_by(|a, b| a.interest_rate.total_cmp(&b.interest_rate))
            }
            Some("name") => liabilities.sort_by(|a, b| a.name.cmp(&b.name)),
            _ => {}
        }
        if query.sort_order.as_deref() == Some("desc") {
            liabilities.reverse();
        }
        Ok(liabilities)
    }

    async fn liability_summary(&self) -> Result<LiabilitySummary> {
        self.enter("liability_summary").await?;
        let store = self.store.read().await;
        let active: Vec<&Liability> = store
            .liabilities
            .iter()
            .filter(|l| l.status == "ACTIVE")
            .collect();

        let mut breakdown: Vec<CategoryBreakdown> = Vec::new();
        for liability in &active {
            match breakdown.iter_mut().find(|b| b.category == liability.category) {
                Some(entry) => {
                    entry.total_balance += liability.current_balance;
                    entry.loans_count += 1;
                }
                None => breakdown.push(CategoryBreakdown {
                    category: liability.category,
                    total_balance: liability.current_balance,
                    loans_count: 1,
                }),
            }
        }

        Ok(LiabilitySummary {
            total_debt: active.iter().map(|l| l.current_balance).sum(),
            total_monthly_payment: active
                .iter()
                .map(|l| l.monthly_installment.unwrap_or(0.0))
                .sum(),
            average_interest_rate: if active.is_empty() {
                0.0
            } else {
                active.iter().map(|l| l.interest_rate).sum::<f64>() / active.len() as f64
            },
            active_loans_count: active.len(),
            overdue_loans_count: active.iter().filter(|l| l.is_overdue == Some(true)).count(),
            category_breakdown: breakdown,
            currency: Some(self.currency.clone()),
        })
    }

    async fn create_liability(&self, request: CreateLiabilityRequest) -> Result<Liability> {
        self.enter("create_liability").await?;
        if request.name.trim().is_empty() {
            return Err(CashaError::remote("Liability name is required"));
        }
        if request.interest_rate < 0.0 {
            return Err(CashaError::remote("Interest rate cannot be negative"));
        }

        let current_balance = if request.category.is_credit_card() {
            request.current_balance.unwrap_or(0.0)
        } else {
            request.current_balance.unwrap_or(request.principal)
        };
        let monthly_installment = request.monthly_installment.or_else(|| {
            match request.tenor {
                Some(tenor) if tenor > 0 && !request.category.is_revolving() => {
                    Some(request.principal / tenor as f64)
                }
                _ => None,
            }
        });

        let liability = Liability {
            id: new_id(),
            name: request.name.trim().to_string(),
            category: request.category,
            bank_name: request.bank_name,
            principal: request.principal,
            current_balance,
            interest_rate: request.interest_rate,
            interest_type: request.interest_type,
            currency: Some(self.currency.clone()),
            start_date: request.start_date,
            end_date: request.end_date,
            credit_limit: request.credit_limit,
            billing_day: request.billing_day,
            due_day: request.due_day,
            monthly_installment,
            tenor: request.tenor,
            status: "ACTIVE".to_string(),
            is_overdue: Some(false),
            description: request.description,
        };
        self.store.write().await.liabilities.push(liability.clone());
        Ok(liability)
    }

    async fn record_payment(&self, liability_id: &str, request: CreatePaymentRequest)
        -> Result<LiabilityPayment> {
        self.enter("record_payment").await?;
        if request.amount <= 0.0 {
            return Err(CashaError::remote("Payment amount must be greater than 0"));
        }

        let mut guard = self.store.write().await;
        let store = &mut *guard;
        let liability = store
            .liabilities
            .iter_mut()
            .find(|l| l.id == liability_id)
            .ok_or_else(|| CashaError::NotFound(format!("liability {}", liability_id)))?;

        let interest_paid = request.interest_amount.unwrap_or(0.0);
        let principal_paid = request
            .principal_amount
            .unwrap_or(request.amount - interest_paid);
        liability.current_balance = (liability.current_balance - principal_paid).max(0.0);
        if liability.current_balance <= 0.0 {
            liability.status = "PAID_OFF".to_string();
        }

        let payment = LiabilityPayment {
            id: new_id(),
            liability_id: liability_id.to_string(),
            amount: request.amount,
            principal_paid: Some(principal_paid),
            interest_paid: Some(interest_paid),
            payment_type: request.payment_type,
            balance_after_payment: Some(liability.current_balance),
            datetime: request.payment_date,
        };
        store.payments.push(payment.clone());
        Ok(payment)
    }

    async fn latest_statement(&self, liability_id: &str) -> Result<Option<LiabilityStatement>> {
        self.enter("latest_statement").await?;
        let store = self.store.read().await;
        Ok(store
            .statements
            .iter()
            .filter(|s| s.liability_id == liability_id)
            .max_by_key(|s| s.end_date)
            .cloned())
    }

    async fn statements(&self, liability_id: &str) -> Result<Vec<LiabilityStatement>> {
        self.enter("statements").await?;
        let store = self.store.read().await;
        let mut statements: Vec<LiabilityStatement> = store
            .statements
            .iter()
            .filter(|s| s.liability_id == liability_id)
            .cloned()
            .collect();
        statements.sort_by(|a, b| b.end_date.cmp(&a.end_date));
        Ok(statements)
    }

    async fn statement_details(&self, liability_id: &str, statement_id: &str)
        -> Result<LiabilityStatement> {
        self.enter("statement_details").await?;
        let store = self.store.read().await;
        let mut statement = store
            .statements
            .iter()
            .find(|s| s.id == statement_id && s.liability_id == liability_id)
            .cloned()
            .ok_or_else(|| CashaError::NotFound(format!("statement {}", statement_id)))?;
        statement.transactions = store
            .liability_transactions
            .iter()
            .filter(|t| t.statement_id.as_deref() == Some(statement_id))
            .cloned()
            .collect();
        Ok(statement)
    }

    async fn unbilled_transactions(&self, liability_id: &str) -> Result<UnbilledTransactions> {
        self.enter("unbilled_transactions").await?;
        let store = self.store.read().await;
        let liability = store
            .liabilities
            .iter()
            .find(|l| l.id == liability_id)
            .ok_or_else(|| CashaError::NotFound(format!("liability {}", liability_id)))?;

        let transactions: Vec<LiabilityTransaction> = store
            .liability_transactions
            .iter()
            .filter(|t| t.liability_id == liability_id && t.statement_id.is_none())
            .cloned()
            .collect();
        let current_usage: f64 = transactions.iter().map(|t| t.amount).sum();
        let previous_unpaid_balance = store
            .statements
            .iter()
            .filter(|s| s.liability_id == liability_id)
            .max_by_key(|s| s.end_date)
            .map(|s| (s.statement_balance - s.payments_made).max(0.0))
            .unwrap_or(0.0);
        let projected_interest = previous_unpaid_balance * monthly_rate(liability);

        Ok(UnbilledTransactions {
            current_usage,
            previous_unpaid_balance,
            projected_interest,
            total_projected_statement: current_usage + previous_unpaid_balance + projected_interest,
            transactions,
        })
    }

    async fn insights(&self, liability_id: &str) -> Result<LiabilityInsight> {
        self.enter("insights").await?;
        let store = self.store.read().await;
        let liability = store
            .liabilities
            .iter()
            .find(|l| l.id == liability_id)
            .ok_or_else(|| CashaError::NotFound(format!("liability {}", liability_id)))?;

        let total_interest_paid: f64 = store
            .payments
            .iter()
            .filter(|p| p.liability_id == liability_id)
            .filter_map(|p| p.interest_paid)
            .sum();

        let debt = Debt {
            id: liability.id.clone(),
            name: liability.name.clone(),
            balance: liability.current_balance,
            rate: monthly_rate(liability),
            minimum: minimum_payment(liability),
        };
        let projected = project_payoff(std::slice::from_ref(&debt), 0.0, false);

        let mut messages = Vec::new();
        if projected.total_interest > 0.0 {
            messages.push(format!(
                "Paying only the minimum costs about {:.0} in interest over {} months",
                projected.total_interest, projected.months
            ));
        }
        if liability.is_overdue == Some(true) {
            messages.push("This liability is overdue".to_string());
        }

        Ok(LiabilityInsight {
            total_interest_paid,
            projected_interest_if_minimum: projected.total_interest,
            savings_if_paid_in_full: projected.total_interest,
            messages,
        })
    }

    async fn payment_history(&self, liability_id: &str, page: Page) -> Result<PaymentHistory> {
        self.enter("payment_history").await?;
        let store = self.store.read().await;
        let mut payments: Vec<LiabilityPayment> = store
            .payments
            .iter()
            .filter(|p| p.liability_id == liability_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.datetime.cmp(&a.datetime));

        Ok(PaymentHistory {
            total_amount: payments.iter().map(|p| p.amount).sum(),
            total_count: payments.len(),
            payments: paged(&payments, page),
        })
    }

    async fn transactions(&self, liability_id: &str, page: Page)
        -> Result<Vec<LiabilityTransaction>> {
        self.enter("transactions").await?;
        let store = self.store.read().await;
        let mut transactions: Vec<LiabilityTransaction> = store
            .liability_transactions
            .iter()
            .filter(|t| t.liability_id == liability_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(paged(&transactions, page))
    }

    async fn create_transaction(
        &self,
        liability_id: &str,
        request: CreateLiabilityTransactionRequest,
    ) -> Result<LiabilityTransaction> {
        self.enter("create_transaction").await?;
        if request.name.trim().is_empty() {
            return Err(CashaError::remote("Transaction name is required"));
        }
        if request.amount <= 0.0 {
            return Err(CashaError::remote("Amount must be greater than 0"));
        }

        let mut guard = self.store.write().await;
        let store = &mut *guard;
        let liability = store
            .liabilities
            .iter_mut()
            .find(|l| l.id == liability_id)
            .ok_or_else(|| CashaError::NotFound(format!("liability {}", liability_id)))?;
        liability.current_balance += request.amount;

        let transaction = LiabilityTransaction {
            id: new_id(),
            liability_id: liability_id.to_string(),
            name: request.name.trim().to_string(),
            amount: request.amount,
            category_id: Some(request.category_id),
            statement_id: None,
            datetime: request.datetime,
        };
        store.liability_transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn add_installment(&self, liability_id: &str, request: CreateInstallmentRequest)
        -> Result<LiabilityTransaction> {
        self.enter("add_installment").await?;
        if request.tenor == 0 || request.monthly_amount <= 0.0 {
            return Err(CashaError::remote("Tenor and monthly amount must be greater than 0"));
        }
        if request.current_month == 0 || request.current_month > request.tenor {
            return Err(CashaError::remote("Current month must be within the tenor"));
        }

        let mut guard = self.store.write().await;
        let store = &mut *guard;
        let liability = store
            .liabilities
            .iter_mut()
            .find(|l| l.id == liability_id)
            .ok_or_else(|| CashaError::NotFound(format!("liability {}", liability_id)))?;
        liability.current_balance += request.monthly_amount;

        let datetime = request
            .start_date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        let transaction = LiabilityTransaction {
            id: new_id(),
            liability_id: liability_id.to_string(),
            name: format!(
                "{} ({}/{})",
                request.name.trim(),
                request.current_month,
                request.tenor
            ),
            amount: request.monthly_amount,
            category_id: None,
            statement_id: None,
            datetime,
        };
        store.liability_transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn simulate_payoff(&self, request: SimulatePayoffRequest)
        -> Result<SimulatePayoffResponse> {
        self.enter("simulate_payoff").await?;
        let store = self.store.read().await;
        let mut debts: Vec<Debt> = store
            .liabilities
            .iter()
            .filter(|l| l.status == "ACTIVE" && l.current_balance > 0.0)
            .map(|l| Debt {
                id: l.id.clone(),
                name: l.name.clone(),
                balance: l.current_balance,
                rate: monthly_rate(l),
                minimum: minimum_payment(l),
            })
            .collect();

        if debts.is_empty() {
            return Ok(SimulatePayoffResponse {
                total_months_to_pay_off: 0,
                total_payment_amount: 0.0,
                interest_saved: 0.0,
                months_saved: 0,
                recommendation: "No active liabilities to pay off".to_string(),
                breakdown: Vec::new(),
            });
        }

        match request.strategy {
            SimulationStrategy::Avalanche => debts.sort_by(|a, b| b.rate.total_cmp(&a.rate)),
            SimulationStrategy::Snowball => debts.sort_by(|a, b| a.balance.total_cmp(&b.balance)),
            SimulationStrategy::Custom => {}
        }

        let additional = request.additional_payment.unwrap_or(0.0).max(0.0);
        let baseline = project_payoff(&debts, 0.0, false);
        let plan = project_payoff(&debts, additional, true);

        let recommendation = match (request.strategy, debts.first()) {
            (SimulationStrategy::Avalanche, Some(first)) => {
                format!("Focus extra payments on {} (highest interest) first", first.name)
            }
            (SimulationStrategy::Snowball, Some(first)) => {
                format!("Clear {} (smallest balance) first for a quick win", first.name)
            }
            _ => "Keep paying in your chosen order".to_string(),
        };

        let breakdown = debts
            .iter()
            .zip(plan.per_debt.iter())
            .map(|(debt, (months, interest))| PayoffBreakdown {
                id: debt.id.clone(),
                name: debt.name.clone(),
                current_balance: debt.balance,
                monthly_payment: debt.minimum,
                months_to_pay_off: *months,
                total_interest: *interest,
            })
            .collect();

        Ok(SimulatePayoffResponse {
            total_months_to_pay_off: plan.months,
            total_payment_amount: plan.total_paid,
            interest_saved: (baseline.total_interest - plan.total_interest).max(0.0),
            months_saved: baseline.months.saturating_sub(plan.months),
            recommendation,
            breakdown,
        })
    }

    async fn delete_liability(&self, liability_id: &str) -> Result<()> {
        self.enter("delete_liability").await?;
        let mut store = self.store.write().await;
        let before = store.liabilities.len();
        store.liabilities.retain(|l| l.id != liability_id);
        if store.liabilities.len() == before {
            return Err(CashaError::NotFound(format!("liability {}", liability_id)));
        }
        store.payments.retain(|p| p.liability_id != liability_id);
        store.liability_transactions.retain(|t| t.liability_id != liability_id);
        store.statements.retain(|s| s.liability_id != liability_id);
        Ok(())
    }
}

// ================= Portfolio =================

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

#[async_trait::async_trait]
impl PortfolioUseCases for InMemoryBackend {
    async fn assets(&self) -> Result<Vec<Asset>> {
        self.enter("assets").await?;
        Ok(self.store.read().await.assets.clone())
    }

    async fn portfolio_summary(&self) -> Result<PortfolioSummary> {
        self.enter("portfolio_summary").await?;
        let store = self.store.read().await;

        let mut by_type: BTreeMap<AssetType, AssetBreakdown> = BTreeMap::new();
        for asset in &store.assets {
            let entry = by_type.entry(asset.asset_type).or_insert(AssetBreakdown {
                asset_type: asset.asset_type,
                amount: 0.0,
                count: 0,
            });
            entry.amount += asset.amount;
            entry.count += 1;
        }
        let mut breakdown: Vec<AssetBreakdown> = by_type.into_values().collect();
        breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));

        Ok(PortfolioSummary {
            currency: self.currency.clone(),
            total_assets: store.assets.iter().map(|a| a.amount).sum(),
            breakdown,
            last_updated: store
                .assets
                .iter()
                .map(|a| a.updated_at)
                .max()
                .unwrap_or_else(Utc::now),
        })
    }

    async fn create_asset(&self, request: CreateAssetRequest) -> Result<Asset> {
        self.enter("create_asset").await?;
        if request.name.trim().is_empty() {
            return Err(CashaError::remote("Asset name cannot be empty"));
        }

        let (amount, quantity, price) = if request.asset_type.is_quantity_based() {
            match (positive(request.quantity), positive(request.price_per_unit)) {
                (Some(quantity), Some(price)) => (quantity * price, Some(quantity), Some(price)),
                _ => {
                    return Err(CashaError::remote(
                        "Quantity and price must be greater than 0",
                    ))
                }
            }
        } else {
            match positive(request.amount) {
                Some(amount) => (amount, request.quantity, request.price_per_unit),
                None => return Err(CashaError::remote("Amount must be greater than 0")),
            }
        };

        let asset = Asset {
            id: new_id(),
            name: request.name.trim().to_string(),
            asset_type: request.asset_type,
            amount,
            currency: request.currency.unwrap_or_else(|| self.currency.clone()),
            description: request.description,
            quantity,
            unit: request
                .unit
                .or_else(|| request.asset_type.recommended_unit().map(str::to_string)),
            price_per_unit: price,
            acquisition_date: request.acquisition_date,
            location: request.location,
            updated_at: Utc::now(),
        };
        self.store.write().await.assets.push(asset.clone());
        Ok(asset)
    }

    async fn update_asset(&self, id: &str, request: UpdateAssetRequest) -> Result<Asset> {
        self.enter("update_asset").await?;
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(CashaError::remote("Asset name cannot be empty"));
            }
        }

        let mut store = self.store.write().await;
        let asset = store
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| CashaError::NotFound(format!("asset {}", id)))?;

        let mut updated = asset.clone();
        if let Some(name) = request.name {
            updated.name = name.trim().to_string();
        }
        if request.quantity.is_some() {
            updated.quantity = request.quantity;
        }
        if request.price_per_unit.is_some() {
            updated.price_per_unit = request.price_per_unit;
        }
        if request.unit.is_some() {
            updated.unit = request.unit;
        }
        if request.acquisition_date.is_some() {
            updated.acquisition_date = request.acquisition_date;
        }
        if request.location.is_some() {
            updated.location = request.location;
        }
        if request.description.is_some() {
            updated.description = request.description;
        }

        updated.amount = match (
            updated.asset_type.is_quantity_based(),
            updated.quantity,
            updated.price_per_unit,
        ) {
            (true, Some(quantity), Some(price)) => quantity * price,
            _ => request.amount.unwrap_or(updated.amount),
        };
        if updated.amount <= 0.0 {
            return Err(CashaError::remote("Amount must be greater than 0"));
        }
        updated.updated_at = Utc::now();

        *asset = updated.clone();
        Ok(updated)
    }

    async fn delete_asset(&self, id: &str) -> Result<()> {
        self.enter("delete_asset").await?;
        let mut store = self.store.write().await;
        let before = store.assets.len();
        store.assets.retain(|a| a.id != id);
        if store.assets.len() == before {
            return Err(CashaError::NotFound(format!("asset {}", id)));
        }
        store.asset_transactions.retain(|t| t.asset_id != id);
        Ok(())
    }

    async fn add_asset_transaction(
        &self,
        asset_id: &str,
        request: CreateAssetTransactionRequest,
    ) -> Result<AssetTransaction> {
        self.enter("add_asset_transaction").await?;
        let total = request.total();
        if total <= 0.0 {
            return Err(CashaError::remote("Amount must be greater than 0"));
        }

        let mut guard = self.store.write().await;
        let store = &mut *guard;
        let asset = store
            .assets
            .iter_mut()
            .find(|a| a.id == asset_id)
            .ok_or_else(|| CashaError::NotFound(format!("asset {}", asset_id)))?;

        match request.transaction_type {
            AssetTransactionType::Saving => {
                asset.amount += total;
                if let (Some(held), Some(quantity)) = (asset.quantity, request.quantity) {
                    asset.quantity = Some(held + quantity);
                }
            }
            AssetTransactionType::Withdraw => {
                if total > asset.amount {
                    return Err(CashaError::remote("Insufficient asset balance"));
                }
                asset.amount -= total;
                if let (Some(held), Some(quantity)) = (asset.quantity, request.quantity) {
                    asset.quantity = Some((held - quantity).max(0.0));
                }
            }
        }
        asset.updated_at = Utc::now();

        let transaction = AssetTransaction {
            id: new_id(),
            asset_id: asset_id.to_string(),
            transaction_type: request.transaction_type,
            quantity: request.quantity,
            price_per_unit: request.price_per_unit,
            total_amount: total,
            note: request.note,
            datetime: request.datetime.unwrap_or_else(Utc::now),
        };
        store.asset_transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn asset_transactions(&self, asset_id: &str) -> Result<Vec<AssetTransaction>> {
        self.enter("asset_transactions").await?;
        let store = self.store.read().await;
        let mut transactions: Vec<AssetTransaction> = store
            .asset_transactions
            .iter()
            .filter(|t| t.asset_id == asset_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(transactions)
    }

    async fn total_expenses(&self) -> Result<f64> {
        self.enter("total_expenses").await?;
        Ok(self.store.read().await.total_expenses)
    }
}

// ================= Transactions =================

impl Store {
    /// Local transactions as expenses plus recorded incomes, newest first
    fn cashflow(&self, filter: &CashflowFilter) -> Vec<CashflowEntry> {
        let mut entries: Vec<CashflowEntry> = self
            .transactions
            .iter()
            .map(Transaction::to_entry)
            .chain(self.incomes.iter().cloned())
            .filter(|e| filter.contains(e.date.date_naive()))
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }

    fn spending_between(&self, from: NaiveDate, to: NaiveDate) -> f64 {
        self.transactions
            .iter()
            .filter(|t| {
                let day = t.datetime.date_naive();
                day >= from && day <= to
            })
            .map(|t| t.amount)
            .sum()
    }
}

fn cashflow_summary(entries: &[CashflowEntry], filter: &CashflowFilter, currency: &str)
    -> CashflowSummary {
    let mut income_breakdown = BTreeMap::new();
    let mut expense_breakdown = BTreeMap::new();
    for entry in entries {
        let breakdown = match entry.entry_type {
            CashflowType::Income => &mut income_breakdown,
            CashflowType::Expense => &mut expense_breakdown,
        };
        *breakdown.entry(entry.category.clone()).or_insert(0.0) += entry.amount;
    }
    let total_income: f64 = income_breakdown.values().sum();
    let total_expense: f64 = expense_breakdown.values().sum();
    CashflowSummary {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
        period_label: filter.label.clone(),
        currency: currency.to_string(),
        income_breakdown,
        expense_breakdown,
    }
}

#[async_trait::async_trait]
impl TransactionUseCases for InMemoryBackend {
    async fn cashflow_history(&self, filter: &CashflowFilter, page: Page)
        -> Result<Vec<CashflowEntry>> {
        self.enter("cashflow_history").await?;
        let store = self.store.read().await;
        Ok(store
            .cashflow(filter)
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .collect())
    }

    async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.enter("transactions").await?;
        Ok(self.store.read().await.transactions.clone())
    }

    async fn add_transaction(&self, request: TransactionRequest) -> Result<Transaction> {
        self.enter("add_transaction").await?;
        let transaction = Transaction {
            id: new_id(),
            name: request.name.trim().to_string(),
            category: request.category,
            amount: request.amount,
            datetime: request.datetime,
            note: request.note,
            is_synced: false,
        };
        self.store.write().await.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        self.enter("update_transaction").await?;
        let mut store = self.store.write().await;
        let stored = store
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction.id)
            .ok_or_else(|| CashaError::NotFound(format!("transaction {}", transaction.id)))?;
        *stored = Transaction {
            is_synced: false,
            ..transaction
        };
        Ok(stored.clone())
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.enter("delete_transaction").await?;
        let mut store = self.store.write().await;
        let before = store.transactions.len();
        store.transactions.retain(|t| t.id != id);
        if store.transactions.len() == before {
            return Err(CashaError::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    async fn sync_transactions(&self) -> Result<()> {
        self.enter("sync_transactions").await?;
        let mut store = self.store.write().await;
        for transaction in store.transactions.iter_mut() {
            transaction.is_synced = true;
        }
        Ok(())
    }

    async fn transaction_categories(&self) -> Result<Vec<BudgetCategory>> {
        self.enter("transaction_categories").await?;
        Ok(self.store.read().await.budget_categories.clone())
    }
}

// ================= Dashboard =================

#[async_trait::async_trait]
impl DashboardUseCases for InMemoryBackend {
    async fn total_spending(&self, filter: &CashflowFilter) -> Result<f64> {
        self.enter("total_spending").await?;
        let store = self.store.read().await;
        Ok(store
            .transactions
            .iter()
            .filter(|t| filter.contains(t.datetime.date_naive()))
            .map(|t| t.amount)
            .sum())
    }

    async fn spending_report(&self, today: NaiveDate) -> Result<SpendingReport> {
        self.enter("spending_report").await?;
        let store = self.store.read().await;

        let week = SpendingPeriod::ThisWeek.filter(today);
        let month = SpendingPeriod::ThisMonth.filter(today);
        let total = |filter: &CashflowFilter| match (filter.start, filter.end) {
            (Some(from), Some(to)) => store.spending_between(from, to),
            _ => 0.0,
        };

        let daily_bars = (0..7)
            .rev()
            .map(|back| {
                let day = today - Days::days(back);
                ChartBar {
                    label: day.format("%a").to_string(),
                    value: store.spending_between(day, day),
                }
            })
            .collect();
        let weekly_bars = (0..4)
            .rev()
            .map(|back| {
                let to = today - Days::days(7 * back);
                ChartBar {
                    label: format!("W{}", 4 - back),
                    value: store.spending_between(to - Days::days(6), to),
                }
            })
            .collect();

        Ok(SpendingReport {
            this_week_total: total(&week),
            this_month_total: total(&month),
            daily_bars,
            weekly_bars,
        })
    }

    async fn unsynced_count(&self) -> Result<usize> {
        self.enter("unsynced_count").await?;
        let store = self.store.read().await;
        Ok(store.transactions.iter().filter(|t| !t.is_synced).count())
    }

    async fn cashflow_summary(&self, filter: &CashflowFilter) -> Result<CashflowSummary> {
        self.enter("cashflow_summary").await?;
        let store = self.store.read().await;
        Ok(cashflow_summary(&store.cashflow(filter), filter, &self.currency))
    }

    async fn local_cashflow_summary(&self, filter: &CashflowFilter) -> Result<CashflowSummary> {
        self.enter("local_cashflow_summary").await?;
        let store = self.store.read().await;
        Ok(cashflow_summary(&store.cashflow(filter), filter, &self.currency))
    }

    async fn sync_cashflow(&self) -> Result<()> {
        self.enter("sync_cashflow").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(name: &str, category: LiabilityCategory, principal: f64, rate: f64)
        -> CreateLiabilityRequest {
        CreateLiabilityRequest {
            name: name.to_string(),
            bank_name: None,
            category,
            credit_limit: None,
            billing_day: None,
            due_day: None,
            min_payment_percentage: None,
            interest_rate: rate,
            interest_type: Some(InterestType::Yearly),
            principal,
            current_balance: None,
            start_date: None,
            end_date: None,
            description: None,
            tenor: None,
            monthly_installment: None,
        }
    }

    fn cash_asset(name: &str, amount: Option<f64>) -> CreateAssetRequest {
        CreateAssetRequest {
            name: name.to_string(),
            asset_type: AssetType::Cash,
            amount,
            currency: None,
            description: None,
            quantity: None,
            unit: None,
            price_per_unit: None,
            acquisition_date: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_calls_are_counted_per_operation() {
        let backend = InMemoryBackend::default();
        backend.assets().await.unwrap();
        backend.assets().await.unwrap();
        backend.total_expenses().await.unwrap();

        assert_eq!(backend.calls("assets"), 2);
        assert_eq!(backend.calls("total_expenses"), 1);
        assert_eq!(backend.calls("portfolio_summary"), 0);

        backend.reset_calls();
        assert_eq!(backend.calls("assets"), 0);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = InMemoryBackend::default();
        backend.fail("goals", "Server is down");
        assert!(matches!(backend.goals().await, Err(CashaError::Remote(m)) if m == "Server is down"));

        backend.fail("goals", "");
        assert!(matches!(backend.goals().await, Err(CashaError::Unavailable)));

        backend.recover("goals");
        assert!(backend.goals().await.unwrap().is_empty());
        assert_eq!(backend.calls("goals"), 3);
    }

    #[tokio::test]
    async fn test_login_against_accounts() {
        let backend = InMemoryBackend::default();
        backend.add_account("a@b.com", "secret1", Some("IDR")).await;

        let result = backend.login("A@B.com", "secret1").await.unwrap();
        assert_eq!(result.currency.as_deref(), Some("IDR"));

        let err = backend.login("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err.user_message().as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let backend = InMemoryBackend::default();
        backend.register("Ann", "ann@b.com", "+628123", "secret1").await.unwrap();
        assert!(backend.register("Ann", "ann@b.com", "+628123", "secret1").await.is_err());
        assert!(backend.reset_password("ann@b.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_asset_validation_messages() {
        let backend = InMemoryBackend::default();

        let err = backend.create_asset(cash_asset("  ", Some(10.0))).await.unwrap_err();
        assert_eq!(err.to_string(), "Asset name cannot be empty");

        let err = backend.create_asset(cash_asset("Wallet", Some(0.0))).await.unwrap_err();
        assert_eq!(err.to_string(), "Amount must be greater than 0");

        let mut gold = cash_asset("Gold", None);
        gold.asset_type = AssetType::GoldPhysical;
        gold.quantity = Some(10.0);
        let err = backend.create_asset(gold.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "Quantity and price must be greater than 0");

        gold.price_per_unit = Some(1_000_000.0);
        let asset = backend.create_asset(gold).await.unwrap();
        assert_eq!(asset.amount, 10_000_000.0);
        assert_eq!(asset.unit.as_deref(), Some("gram"));
    }

    #[tokio::test]
    async fn test_asset_transactions_adjust_amount() {
        let backend = InMemoryBackend::default();
        let asset = backend.create_asset(cash_asset("Wallet", Some(100.0))).await.unwrap();

        let saving = CreateAssetTransactionRequest {
            transaction_type: AssetTransactionType::Saving,
            quantity: None,
            price_per_unit: None,
            amount: Some(50.0),
            datetime: None,
            note: None,
        };
        backend.add_asset_transaction(&asset.id, saving.clone()).await.unwrap();

        let withdraw = CreateAssetTransactionRequest {
            transaction_type: AssetTransactionType::Withdraw,
            amount: Some(500.0),
            ..saving
        };
        let err = backend.add_asset_transaction(&asset.id, withdraw).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient asset balance");

        let summary = backend.portfolio_summary().await.unwrap();
        assert_eq!(summary.total_assets, 150.0);
        assert_eq!(backend.asset_transactions(&asset.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_can_pay_off_liability() {
        let backend = InMemoryBackend::default();
        let liability = backend
            .create_liability(loan("Car", LiabilityCategory::AutoLoan, 1_000.0, 6.0))
            .await
            .unwrap();

        let payment = CreatePaymentRequest {
            amount: 1_000.0,
            payment_date: Utc::now(),
            payment_type: Some(PaymentType::Full),
            principal_amount: None,
            interest_amount: None,
            notes: None,
        };
        backend.record_payment(&liability.id, payment).await.unwrap();

        let active = backend
            .liabilities(&LiabilityQuery::active_by_balance())
            .await
            .unwrap();
        let paid_off = backend.liabilities(&LiabilityQuery::paid_off()).await.unwrap();
        assert!(active.is_empty());
        assert_eq!(paid_off.len(), 1);

        let history = backend
            .payment_history(&liability.id, Page::default())
            .await
            .unwrap();
        assert_eq!(history.total_count, 1);
        assert_eq!(history.total_amount, 1_000.0);
    }

    #[tokio::test]
    async fn test_credit_card_starts_from_current_balance() {
        let backend = InMemoryBackend::default();
        let mut card = loan("Visa", LiabilityCategory::CreditCard, 0.0, 24.0);
        card.credit_limit = Some(10_000.0);
        card.current_balance = Some(2_500.0);

        let liability = backend.create_liability(card).await.unwrap();
        assert_eq!(liability.current_balance, 2_500.0);
        assert_eq!(liability.available_credit(), Some(7_500.0));
        assert!(liability.monthly_installment.is_none());
    }

    #[tokio::test]
    async fn test_payoff_strategy_ordering() {
        let backend = InMemoryBackend::default();
        backend
            .create_liability(loan("Small", LiabilityCategory::PersonalLoan, 500.0, 5.0))
            .await
            .unwrap();
        backend
            .create_liability(loan("Expensive", LiabilityCategory::CreditCard, 0.0, 30.0))
            .await
            .unwrap();
        backend
            .create_liability(loan("Big", LiabilityCategory::Mortgage, 5_000.0, 10.0))
            .await
            .unwrap();

        let avalanche = backend
            .simulate_payoff(SimulatePayoffRequest {
                strategy: SimulationStrategy::Avalanche,
                additional_payment: Some(200.0),
            })
            .await
            .unwrap();
        // zero-balance credit card is excluded
        assert_eq!(avalanche.breakdown.len(), 2);
        assert_eq!(avalanche.breakdown[0].name, "Big");
        assert!(avalanche.months_saved > 0);
        assert!(avalanche.interest_saved > 0.0);

        let snowball = backend
            .simulate_payoff(SimulatePayoffRequest {
                strategy: SimulationStrategy::Snowball,
                additional_payment: None,
            })
            .await
            .unwrap();
        assert_eq!(snowball.breakdown[0].name, "Small");
    }

    #[tokio::test]
    async fn test_liability_summary_totals() {
        let backend = InMemoryBackend::default();
        let mut mortgage = loan("House", LiabilityCategory::Mortgage, 1_200.0, 8.0);
        mortgage.tenor = Some(12);
        backend.create_liability(mortgage).await.unwrap();
        backend
            .create_liability(loan("Car", LiabilityCategory::AutoLoan, 800.0, 4.0))
            .await
            .unwrap();

        let summary = backend.liability_summary().await.unwrap();
        assert_eq!(summary.total_debt, 2_000.0);
        assert_eq!(summary.total_monthly_payment, 100.0);
        assert_eq!(summary.average_interest_rate, 6.0);
        assert_eq!(summary.active_loans_count, 2);
        assert_eq!(summary.category_breakdown.len(), 2);
    }

    #[tokio::test]
    async fn test_apply_recommendations_upserts_budgets() {
        let backend = InMemoryBackend::default();
        backend
            .add_budget(NewBudgetRequest {
                id: None,
                amount: 100.0,
                month: "2026-10".to_string(),
                category: "Food".to_string(),
            })
            .await
            .unwrap();

        backend
            .apply_recommendations(ApplyRecommendationsRequest {
                month: "October 2026".to_string(),
                budgets: vec![
                    RecommendedBudgetPayload { amount: 300.0, category: "Food".to_string() },
                    RecommendedBudgetPayload { amount: 50.0, category: "Transport".to_string() },
                    RecommendedBudgetPayload { amount: 0.0, category: "Bills".to_string() },
                ],
            })
            .await
            .unwrap();

        let budgets = backend.fetch_budgets("2026-10").await.unwrap();
        assert_eq!(budgets.len(), 2);
        assert!(budgets.iter().any(|b| b.category == "Food" && b.amount == 300.0));
    }

    #[tokio::test]
    async fn test_goal_contribution_completes_goal() {
        let backend = InMemoryBackend::default();
        let category = backend.goal_categories().await.unwrap().remove(0);
        let goal = backend
            .create_goal(CreateGoalRequest {
                name: "Laptop".to_string(),
                target_amount: 100.0,
                category,
                deadline: None,
                asset_id: None,
                icon: None,
                color: None,
                note: None,
            })
            .await
            .unwrap();

        backend.add_contribution(&goal.id, 100.0, None).await.unwrap();

        let goal = backend.goal(&goal.id).await.unwrap();
        assert_eq!(goal.status, GoalStatus::Completed);
        assert_eq!(goal.progress.percentage, 100.0);
        assert_eq!(goal.recent_contributions.len(), 1);

        let summary = backend.goal_summary().await.unwrap();
        assert_eq!(summary.completed_goals, 1);
    }

    #[tokio::test]
    async fn test_cashflow_history_merges_and_pages() {
        use chrono::TimeZone;

        let backend = InMemoryBackend::default();
        for day in 1..=3 {
            backend
                .add_transaction(TransactionRequest {
                    name: format!("Expense {}", day),
                    category: "Food".to_string(),
                    amount: 10.0 * day as f64,
                    datetime: Utc.with_ymd_and_hms(2026, 10, day, 9, 0, 0).unwrap(),
                    note: None,
                })
                .await
                .unwrap();
        }
        backend
            .insert_income(CashflowEntry {
                id: "inc-1".to_string(),
                title: "Salary".to_string(),
                amount: 500.0,
                category: "Salary".to_string(),
                entry_type: CashflowType::Income,
                date: Utc.with_ymd_and_hms(2026, 10, 2, 12, 0, 0).unwrap(),
            })
            .await;

        let october = CashflowFilter::month("2026-10").unwrap();
        let first = backend
            .cashflow_history(&october, Page { page: 1, page_size: 2 })
            .await
            .unwrap();
        let titles: Vec<&str> = first.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Expense 3", "Salary"]);

        let summary = backend.cashflow_summary(&october).await.unwrap();
        assert_eq!(summary.total_income, 500.0);
        assert_eq!(summary.total_expense, 60.0);
        assert_eq!(summary.net_balance, 440.0);
        assert_eq!(summary.period_label, "October 2026");

        assert_eq!(backend.unsynced_count().await.unwrap(), 3);
        backend.sync_transactions().await.unwrap();
        assert_eq!(backend.unsynced_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spending_report_bars() {
        use chrono::TimeZone;

        let backend = InMemoryBackend::default();
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        for (day, amount) in [(15, 20.0), (14, 5.0), (1, 100.0)] {
            backend
                .insert_transaction(Transaction {
                    id: new_id(),
                    name: "Spend".to_string(),
                    category: "Food".to_string(),
                    amount,
                    datetime: Utc.with_ymd_and_hms(2026, 10, day, 9, 0, 0).unwrap(),
                    note: None,
                    is_synced: true,
                })
                .await;
        }

        let report = backend.spending_report(today).await.unwrap();
        assert_eq!(report.this_week_total, 25.0);
        assert_eq!(report.this_month_total, 125.0);
        assert_eq!(report.daily_bars.len(), 7);
        assert_eq!(report.daily_bars[6].label, "Thu");
        assert_eq!(report.daily_bars[6].value, 20.0);
        assert_eq!(report.weekly_bars[3].label, "W4");
        assert_eq!(report.weekly_bars[3].value, 25.0);
        assert_eq!(report.weekly_bars[1].value, 100.0);
    }
}
