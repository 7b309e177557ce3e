//! Loans, credit cards and pay-later liabilities

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiabilityCategory {
    Mortgage,
    PersonalLoan,
    AutoLoan,
    StudentLoan,
    BusinessLoan,
    CreditCard,
    PayLater,
    Other,
}

impl LiabilityCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            LiabilityCategory::Mortgage => "Mortgage (KPR)",
            LiabilityCategory::PersonalLoan => "Personal Loan",
            LiabilityCategory::AutoLoan => "Auto Loan",
            LiabilityCategory::StudentLoan => "Student Loan",
            LiabilityCategory::BusinessLoan => "Business Loan",
            LiabilityCategory::CreditCard => "Credit Card",
            LiabilityCategory::PayLater => "Pay Later",
            LiabilityCategory::Other => "Other",
        }
    }

    pub fn is_credit_card(&self) -> bool {
        matches!(self, LiabilityCategory::CreditCard)
    }

    /// Credit lines without a fixed schedule
    pub fn is_revolving(&self) -> bool {
        matches!(self, LiabilityCategory::CreditCard | LiabilityCategory::PayLater)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestType {
    Monthly,
    Yearly,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Full,
    Partial,
    Minimum,
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationStrategy {
    /// Highest interest rate first
    Avalanche,
    /// Smallest balance first
    Snowball,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liability {
    pub id: String,
    pub name: String,
    pub category: LiabilityCategory,
    pub bank_name: Option<String>,
    pub principal: f64,
    pub current_balance: f64,
    pub interest_rate: f64,
    pub interest_type: Option<InterestType>,
    pub currency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub credit_limit: Option<f64>,
    pub billing_day: Option<u32>,
    pub due_day: Option<u32>,
    pub monthly_installment: Option<f64>,
    pub tenor: Option<u32>,
    /// "ACTIVE" or "PAID_OFF"
    pub status: String,
    pub is_overdue: Option<bool>,
    pub description: Option<String>,
}

impl Liability {
    pub fn available_credit(&self) -> Option<f64> {
        self.credit_limit.map(|limit| (limit - self.current_balance).max(0.0))
    }

    /// Share of the principal already repaid, `0.0..=1.0`
    pub fn paid_ratio(&self) -> f64 {
        if self.principal <= 0.0 {
            return 0.0;
        }
        ((self.principal - self.current_balance) / self.principal).clamp(0.0, 1.0)
    }
}

/// Filter/sort parameters of a liability listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiabilityQuery {
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl LiabilityQuery {
    pub fn active_by_balance() -> Self {
        Self {
            status: Some("ACTIVE".to_string()),
            sort_by: Some("balance".to_string()),
            sort_order: Some("desc".to_string()),
        }
    }

    pub fn paid_off() -> Self {
        Self {
            status: Some("PAID_OFF".to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: LiabilityCategory,
    pub total_balance: f64,
    pub loans_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilitySummary {
    pub total_debt: f64,
    pub total_monthly_payment: f64,
    pub average_interest_rate: f64,
    pub active_loans_count: usize,
    pub overdue_loans_count: usize,
    #[serde(default)]
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLiabilityRequest {
    pub name: String,
    pub bank_name: Option<String>,
    pub category: LiabilityCategory,
    pub credit_limit: Option<f64>,
    pub billing_day: Option<u32>,
    pub due_day: Option<u32>,
    pub min_payment_percentage: Option<f64>,
    pub interest_rate: f64,
    pub interest_type: Option<InterestType>,
    pub principal: f64,
    pub current_balance: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub tenor: Option<u32>,
    pub monthly_installment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: f64,
    pub payment_date: DateTime<Utc>,
    pub payment_type: Option<PaymentType>,
    pub principal_amount: Option<f64>,
    pub interest_amount: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInstallmentRequest {
    pub name: String,
    pub total_amount: f64,
    pub monthly_amount: f64,
    pub tenor: u32,
    pub current_month: u32,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLiabilityTransactionRequest {
    pub name: String,
    pub amount: f64,
    pub category_id: String,
    pub datetime: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilityPayment {
    pub id: String,
    pub liability_id: String,
    pub amount: f64,
    pub principal_paid: Option<f64>,
    pub interest_paid: Option<f64>,
    pub payment_type: Option<PaymentType>,
    pub balance_after_payment: Option<f64>,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilityTransaction {
    pub id: String,
    pub liability_id: String,
    pub name: String,
    pub amount: f64,
    pub category_id: Option<String>,
    pub statement_id: Option<String>,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilityStatement {
    pub id: String,
    pub liability_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub due_date: NaiveDate,
    pub statement_balance: f64,
    pub minimum_payment: f64,
    /// OPEN, PAID, PARTIAL or LATE
    pub status: String,
    pub payments_made: f64,
    #[serde(default)]
    pub transactions: Vec<LiabilityTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnbilledTransactions {
    pub current_usage: f64,
    pub previous_unpaid_balance: f64,
    pub projected_interest: f64,
    pub total_projected_statement: f64,
    pub transactions: Vec<LiabilityTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilityInsight {
    pub total_interest_paid: f64,
    pub projected_interest_if_minimum: f64,
    pub savings_if_paid_in_full: f64,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub payments: Vec<LiabilityPayment>,
    pub total_amount: f64,
    pub total_count: usize,
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Page {
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatePayoffRequest {
    pub strategy: SimulationStrategy,
    pub additional_payment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffBreakdown {
    pub id: String,
    pub name: String,
    pub current_balance: f64,
    pub monthly_payment: f64,
    pub months_to_pay_off: u32,
    pub total_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatePayoffResponse {
    pub total_months_to_pay_off: u32,
    pub total_payment_amount: f64,
    pub interest_saved: f64,
    pub months_saved: u32,
    pub recommendation: String,
    pub breakdown: Vec<PayoffBreakdown>,
}
