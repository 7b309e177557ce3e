//! Liability sheets: new liability, payment, card transaction, installment

use super::goal::parse_date;
use super::{optional_text, parse_number, parse_positive, Form};
use crate::models::{
    CreateInstallmentRequest, CreateLiabilityRequest, CreateLiabilityTransactionRequest,
    CreatePaymentRequest, InterestType, LiabilityCategory, PaymentType,
};
use chrono::{DateTime, Utc};

fn parse_day(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|day| (1..=31).contains(day))
}

fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Blank optional fields are fine, garbage is not
fn blank_or<T>(raw: &str, parse: impl Fn(&str) -> Option<T>) -> bool {
    raw.trim().is_empty() || parse(raw).is_some()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateLiabilityForm {
    pub name: String,
    pub bank_name: String,
    pub category: LiabilityCategory,
    pub principal: String,
    pub current_balance: String,
    pub interest_rate: String,
    pub interest_type: Option<InterestType>,
    pub credit_limit: String,
    pub billing_day: String,
    pub due_day: String,
    pub min_payment_percentage: String,
    pub tenor: String,
    pub monthly_installment: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl CreateLiabilityForm {
    pub fn new(category: LiabilityCategory) -> Self {
        Self {
            name: String::new(),
            bank_name: String::new(),
            category,
            principal: String::new(),
            current_balance: String::new(),
            interest_rate: String::new(),
            interest_type: None,
            credit_limit: String::new(),
            billing_day: String::new(),
            due_day: String::new(),
            min_payment_percentage: String::new(),
            tenor: String::new(),
            monthly_installment: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
        }
    }
}

impl Form for CreateLiabilityForm {
    type Request = CreateLiabilityRequest;

    fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("Please enter liability name");
        }
        match parse_number(&self.interest_rate) {
            Some(rate) if rate >= 0.0 => {}
            _ => return Some("Please enter a valid interest rate"),
        }

        if self.category.is_credit_card() {
            if parse_positive(&self.credit_limit).is_none() {
                return Some("Please enter a valid credit limit");
            }
            if !blank_or(&self.billing_day, parse_day) || !blank_or(&self.due_day, parse_day) {
                return Some("Billing and due day must be between 1 and 31");
            }
            if !blank_or(&self.current_balance, |raw| parse_number(raw).filter(|b| *b >= 0.0)) {
                return Some("Please enter a valid balance");
            }
        } else {
            if parse_positive(&self.principal).is_none() {
                return Some("Please enter a valid principal amount");
            }
            if !blank_or(&self.tenor, parse_count) {
                return Some("Tenor must be a whole number of months");
            }
            if !blank_or(&self.current_balance, |raw| parse_number(raw).filter(|b| *b >= 0.0)) {
                return Some("Please enter a valid balance");
            }
        }

        if !blank_or(&self.start_date, parse_date) || !blank_or(&self.end_date, parse_date) {
            return Some("Please enter a valid date");
        }
        None
    }

    fn build(&self) -> Option<CreateLiabilityRequest> {
        let credit_card = self.category.is_credit_card();
        let (principal, current_balance) = if credit_card {
            (0.0, Some(parse_number(&self.current_balance).unwrap_or(0.0)))
        } else {
            (parse_positive(&self.principal)?, parse_number(&self.current_balance))
        };

        Some(CreateLiabilityRequest {
            name: self.name.trim().to_string(),
            bank_name: optional_text(&self.bank_name),
            category: self.category,
            credit_limit: if credit_card { parse_positive(&self.credit_limit) } else { None },
            billing_day: parse_day(&self.billing_day).filter(|_| credit_card),
            due_day: parse_day(&self.due_day).filter(|_| credit_card),
            min_payment_percentage: parse_positive(&self.min_payment_percentage).filter(|_| credit_card),
            interest_rate: parse_number(&self.interest_rate)?,
            interest_type: self.interest_type,
            principal,
            current_balance,
            start_date: parse_date(&self.start_date),
            end_date: parse_date(&self.end_date),
            description: optional_text(&self.description),
            tenor: if credit_card { None } else { parse_count(&self.tenor) },
            monthly_installment: if credit_card { None } else { parse_positive(&self.monthly_installment) },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPaymentForm {
    pub amount: String,
    pub payment_type: Option<PaymentType>,
    pub notes: String,
    pub paid_at: DateTime<Utc>,
}

impl RecordPaymentForm {
    pub fn new(paid_at: DateTime<Utc>) -> Self {
        Self {
            amount: String::new(),
            payment_type: None,
            notes: String::new(),
            paid_at,
        }
    }
}

impl Form for RecordPaymentForm {
    type Request = CreatePaymentRequest;

    fn validation_error(&self) -> Option<&'static str> {
        if parse_positive(&self.amount).is_none() {
            return Some("Amount must be greater than 0");
        }
        None
    }

    fn build(&self) -> Option<CreatePaymentRequest> {
        Some(CreatePaymentRequest {
            amount: parse_positive(&self.amount)?,
            payment_date: self.paid_at,
            payment_type: self.payment_type,
            principal_amount: None,
            interest_amount: None,
            notes: optional_text(&self.notes),
        })
    }
}

/// A purchase charged to a credit card
#[derive(Debug, Clone, PartialEq)]
pub struct AddLiabilityTransactionForm {
    pub name: String,
    pub amount: String,
    pub category_id: Option<String>,
    pub datetime: DateTime<Utc>,
    pub description: String,
}

impl AddLiabilityTransactionForm {
    pub fn new(datetime: DateTime<Utc>) -> Self {
        Self {
            name: String::new(),
            amount: String::new(),
            category_id: None,
            datetime,
            description: String::new(),
        }
    }
}

impl Form for AddLiabilityTransactionForm {
    type Request = CreateLiabilityTransactionRequest;

    fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("Please enter transaction name");
        }
        if parse_positive(&self.amount).is_none() {
            return Some("Amount must be greater than 0");
        }
        if self.category_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            return Some("Please select a category");
        }
        None
    }

    fn build(&self) -> Option<CreateLiabilityTransactionRequest> {
        Some(CreateLiabilityTransactionRequest {
            name: self.name.trim().to_string(),
            amount: parse_positive(&self.amount)?,
            category_id: self.category_id.clone()?,
            datetime: self.datetime,
            description: optional_text(&self.description),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddInstallmentForm {
    pub name: String,
    pub total_amount: String,
    pub monthly_amount: String,
    pub tenor: String,
    pub current_month: String,
    pub start_date: String,
}

impl Form for AddInstallmentForm {
    type Request = CreateInstallmentRequest;

    fn validation_error(&self) -> Option<&'static str> {
        let fields = [
            &self.name,
            &self.total_amount,
            &self.monthly_amount,
            &self.tenor,
            &self.current_month,
            &self.start_date,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Some("Please fill in all fields");
        }

        let tenor = parse_count(&self.tenor);
        let current = parse_count(&self.current_month);
        if parse_positive(&self.total_amount).is_none()
            || parse_positive(&self.monthly_amount).is_none()
            || tenor.is_none()
            || current.is_none()
            || parse_date(&self.start_date).is_none()
        {
            return Some("Please enter valid installment details");
        }
        if current > tenor {
            return Some("Current month cannot exceed the tenor");
        }
        None
    }

    fn build(&self) -> Option<CreateInstallmentRequest> {
        Some(CreateInstallmentRequest {
            name: self.name.trim().to_string(),
            total_amount: parse_positive(&self.total_amount)?,
            monthly_amount: parse_positive(&self.monthly_amount)?,
            tenor: parse_count(&self.tenor)?,
            current_month: parse_count(&self.current_month)?,
            start_date: parse_date(&self.start_date)?,
        })
    }
}
