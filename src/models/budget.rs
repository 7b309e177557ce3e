//! Budget models

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub amount: f64,
    pub spent: f64,
    pub remaining: f64,
    /// Month key, `YYYY-MM`
    pub period: String,
    pub category: String,
    pub currency: String,
    #[serde(default)]
    pub is_synced: bool,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Share of the budget already spent, clamped to `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.amount <= 0.0 {
            return 0.0;
        }
        (self.spent / self.amount).clamp(0.0, 1.0)
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_budget: f64,
    pub total_spent: f64,
    pub total_remaining: f64,
    pub currency: String,
}

impl BudgetSummary {
    /// Aggregate computed on-device when the remote summary is unavailable
    pub fn from_budgets(budgets: &[Budget], currency: &str) -> Self {
        let total_budget: f64 = budgets.iter().map(|b| b.amount).sum();
        let total_spent: f64 = budgets.iter().map(|b| b.spent).sum();
        Self {
            total_budget,
            total_spent,
            total_remaining: total_budget - total_spent,
            currency: budgets
                .first()
                .map(|b| b.currency.clone())
                .unwrap_or_else(|| currency.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudgetRequest {
    pub id: Option<String>,
    pub amount: f64,
    pub month: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecommendation {
    pub id: String,
    pub category: String,
    pub suggested_amount: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecommendationResponse {
    pub strategy: String,
    pub needs_percentage: u32,
    pub wants_percentage: u32,
    pub savings_percentage: u32,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<BudgetRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedBudgetPayload {
    pub amount: f64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyRecommendationsRequest {
    /// Display month, e.g. "October 2026"
    pub month: String,
    pub budgets: Vec<RecommendedBudgetPayload>,
}

/// Fixed monthly expenses keyed by category name
pub type FixedExpenses = BTreeMap<String, f64>;

/// `YYYY-MM` key for the month containing `date`
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Current month first, then the preceding eleven
pub fn month_options(today: NaiveDate) -> Vec<String> {
    let mut options = Vec::with_capacity(12);
    let (mut year, mut month) = (today.year(), today.month());
    for _ in 0..12 {
        options.push(format!("{:04}-{:02}", year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    options
}

/// "2026-10" -> "October 2026"; unparseable keys are returned unchanged
pub fn month_display(key: &str) -> String {
    match NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d") {
        Ok(date) => date.format("%B %Y").to_string(),
        Err(_) => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(amount: f64, spent: f64) -> Budget {
        Budget {
            id: "b-1".to_string(),
            amount,
            spent,
            remaining: amount - spent,
            period: "2026-10".to_string(),
            category: "Food".to_string(),
            currency: "IDR".to_string(),
            is_synced: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(budget(100.0, 25.0).progress(), 0.25);
        assert_eq!(budget(100.0, 150.0).progress(), 1.0);
        assert_eq!(budget(0.0, 10.0).progress(), 0.0);
        assert!(budget(100.0, 150.0).is_over_budget());
    }

    #[test]
    fn test_local_summary() {
        let summary = BudgetSummary::from_budgets(&[budget(100.0, 40.0), budget(50.0, 60.0)], "USD");
        assert_eq!(summary.total_budget, 150.0);
        assert_eq!(summary.total_spent, 100.0);
        assert_eq!(summary.total_remaining, 50.0);
        assert_eq!(summary.currency, "IDR");

        let empty = BudgetSummary::from_budgets(&[], "USD");
        assert_eq!(empty.currency, "USD");
    }

    #[test]
    fn test_month_helpers() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(month_key(today), "2026-02");

        let options = month_options(today);
        assert_eq!(options.len(), 12);
        assert_eq!(options[0], "2026-02");
        assert_eq!(options[2], "2025-12");

        assert_eq!(month_display("2026-10"), "October 2026");
        assert_eq!(month_display("garbage"), "garbage");
    }
}
