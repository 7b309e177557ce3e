//! Ephemeral form state of the creation and edit screens
//!
//! A form holds raw text as typed. It only becomes a request at submit time,
//! and the submit button stays disabled while `is_valid()` is false.

pub mod budget;
pub mod goal;
pub mod liability;
pub mod portfolio;
pub mod register;

pub use budget::{AddBudgetForm, BudgetInput, EditBudgetForm};
pub use goal::{AddContributionForm, AddGoalForm, ContributionInput};
pub use liability::{
    AddInstallmentForm, AddLiabilityTransactionForm, CreateLiabilityForm, RecordPaymentForm,
};
pub use portfolio::{AddAssetTransactionForm, CreateAssetForm, EditAssetForm};
pub use register::{RegisterForm, RegistrationDetails};

pub trait Form {
    type Request;

    /// Message for the first failing rule
    fn validation_error(&self) -> Option<&'static str>;

    /// Only called once `validation_error` is clear
    fn build(&self) -> Option<Self::Request>;

    fn is_valid(&self) -> bool {
        self.validation_error().is_none()
    }

    /// The request, or `None` while the form is invalid
    fn submit(&self) -> Option<Self::Request> {
        if self.is_valid() {
            self.build()
        } else {
            None
        }
    }
}

/// Parse typed numeric input; thousands separators and blanks are tolerated
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn parse_positive(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|value| *value > 0.0)
}

pub(crate) fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,500,000"), Some(1_500_000.0));
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-3"), None);
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("  "), None);
        assert_eq!(optional_text(" BCA "), Some("BCA".to_string()));
    }
}
