//! Add/edit budget sheets

use super::{parse_number, parse_positive, Form};
use crate::models::Budget;

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetInput {
    pub id: Option<String>,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddBudgetForm {
    pub category: String,
    pub amount: String,
}

impl Form for AddBudgetForm {
    type Request = BudgetInput;

    fn validation_error(&self) -> Option<&'static str> {
        if self.category.is_empty() {
            return Some("Please select a category");
        }
        if parse_positive(&self.amount).is_none() {
            return Some("Amount must be greater than 0");
        }
        None
    }

    fn build(&self) -> Option<BudgetInput> {
        Some(BudgetInput {
            id: None,
            category: self.category.clone(),
            amount: parse_positive(&self.amount)?,
        })
    }
}

/// Only the amount is editable
#[derive(Debug, Clone, PartialEq)]
pub struct EditBudgetForm {
    pub budget_id: String,
    pub category: String,
    pub current_amount: f64,
    pub amount: String,
}

impl EditBudgetForm {
    pub fn for_budget(budget: &Budget) -> Self {
        Self {
            budget_id: budget.id.clone(),
            category: budget.category.clone(),
            current_amount: budget.amount,
            amount: format!("{}", budget.amount),
        }
    }
}

impl Form for EditBudgetForm {
    type Request = BudgetInput;

    fn validation_error(&self) -> Option<&'static str> {
        match parse_number(&self.amount) {
            Some(amount) if amount > 0.0 => {
                if amount == self.current_amount {
                    Some("Amount is unchanged")
                } else {
                    None
                }
            }
            _ => Some("Amount must be greater than 0"),
        }
    }

    fn build(&self) -> Option<BudgetInput> {
        Some(BudgetInput {
            id: Some(self.budget_id.clone()),
            category: self.category.clone(),
            amount: parse_positive(&self.amount)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::budget::{BudgetAction, BudgetViewModel};
    use crate::scope::TaskScope;
    use crate::usecase::InMemoryBackend;
    use chrono::{NaiveDate, Utc};
    use std::sync::Arc;

    fn food_budget() -> Budget {
        Budget {
            id: "b-food".to_string(),
            amount: 100.0,
            spent: 20.0,
            remaining: 80.0,
            period: "2026-10".to_string(),
            category: "Food".to_string(),
            currency: "IDR".to_string(),
            is_synced: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_requires_category_and_amount() {
        let mut form = AddBudgetForm {
            category: String::new(),
            amount: "100".to_string(),
        };
        assert!(!form.is_valid());
        assert!(form.submit().is_none());

        form.category = "Food".to_string();
        form.amount = "0".to_string();
        assert!(!form.is_valid());

        form.amount = "1,000".to_string();
        assert_eq!(form.submit().unwrap().amount, 1_000.0);
    }

    #[test]
    fn test_edit_requires_changed_amount() {
        let mut form = EditBudgetForm::for_budget(&food_budget());
        assert!(!form.is_valid());

        form.amount = "-5".to_string();
        assert!(!form.is_valid());

        form.amount = "150".to_string();
        assert!(form.is_valid());
    }

    #[tokio::test]
    async fn test_blank_category_never_reaches_view_model() {
        let backend = InMemoryBackend::default();
        let scope = TaskScope::new("budget");
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let vm = BudgetViewModel::new(Arc::new(backend.clone()), scope.clone(), today);

        let form = AddBudgetForm {
            category: String::new(),
            amount: "250".to_string(),
        };
        if let Some(input) = form.submit() {
            vm.add_budget(&input.category, input.amount);
        }
        scope.settle().await;

        assert_eq!(backend.calls("add_budget"), 0);
        assert_eq!(vm.state().error_message, None);
    }

    #[tokio::test]
    async fn test_valid_edit_updates_once_and_dismisses() {
        let backend = InMemoryBackend::default();
        backend.insert_budget(food_budget()).await;
        let scope = TaskScope::new("budget");
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let vm = BudgetViewModel::new(Arc::new(backend.clone()), scope.clone(), today);

        let mut form = EditBudgetForm::for_budget(&food_budget());
        form.amount = "175".to_string();
        let input = form.submit().unwrap();
        vm.update_budget(input.id.as_deref(), &input.category, input.amount);
        scope.settle().await;

        assert_eq!(backend.calls("update_budget"), 1);
        assert_eq!(vm.take_completed(), Some(BudgetAction::Updated));
    }
}
