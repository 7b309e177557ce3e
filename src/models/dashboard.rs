//! Dashboard aggregates

use super::budget::month_key;
use super::transaction::CashflowFilter;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Income against spending over one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_balance: f64,
    pub period_label: String,
    pub currency: String,
    #[serde(default)]
    pub income_breakdown: BTreeMap<String, f64>,
    #[serde(default)]
    pub expense_breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingReport {
    pub this_week_total: f64,
    pub this_month_total: f64,
    /// Last seven days, oldest first
    pub daily_bars: Vec<ChartBar>,
    /// Last four weeks, oldest first
    pub weekly_bars: Vec<ChartBar>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpendingPeriod {
    ThisWeek,
    #[default]
    ThisMonth,
    LastMonth,
    ThisYear,
    AllTime,
}

impl SpendingPeriod {
    /// Date window of the period as seen on `today`. Weeks start on Monday.
    pub fn filter(&self, today: NaiveDate) -> CashflowFilter {
        match self {
            SpendingPeriod::ThisWeek => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                CashflowFilter {
                    start: Some(monday),
                    end: Some(monday + Duration::days(6)),
                    label: "This week".to_string(),
                }
            }
            SpendingPeriod::ThisMonth => {
                CashflowFilter::month(&month_key(today)).unwrap_or_else(CashflowFilter::all_time)
            }
            SpendingPeriod::LastMonth => {
                let last = today.with_day(1).and_then(|d| d.pred_opt()).unwrap_or(today);
                CashflowFilter::month(&month_key(last)).unwrap_or_else(CashflowFilter::all_time)
            }
            SpendingPeriod::ThisYear => CashflowFilter::year(today.year()),
            SpendingPeriod::AllTime => CashflowFilter::all_time(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartTab {
    #[default]
    Week,
    Month,
}
