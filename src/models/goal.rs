//! Savings goal models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Active,
    Completed,
    Archived,
    OnHold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub percentage: f64,
    pub days_remaining: Option<i64>,
    pub monthly_savings_needed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalContribution {
    pub id: String,
    pub goal_id: String,
    pub amount: f64,
    pub note: Option<String>,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub currency: String,
    pub category: GoalCategory,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub status: GoalStatus,
    pub asset_id: Option<String>,
    pub note: Option<String>,
    pub progress: GoalProgress,
    #[serde(default)]
    pub recent_contributions: Vec<GoalContribution>,
}

impl Goal {
    /// Progress bar fill, `0.0..=1.0`
    pub fn fill_ratio(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSummary {
    pub total_goals: usize,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub total_target: f64,
    pub total_current: f64,
    pub overall_progress: f64,
    pub nearest_deadline: Option<(String, NaiveDate)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    pub name: String,
    pub target_amount: f64,
    pub category: GoalCategory,
    pub deadline: Option<NaiveDate>,
    pub asset_id: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub note: Option<String>,
}
