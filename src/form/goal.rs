//! Goal creation and contribution sheets

use super::{optional_text, parse_positive, Form};
use crate::models::{CreateGoalRequest, GoalCategory};
use chrono::NaiveDate;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddGoalForm {
    pub name: String,
    pub target_amount: String,
    pub category: Option<GoalCategory>,
    /// `YYYY-MM-DD`, optional
    pub deadline: String,
    pub asset_id: Option<String>,
    pub note: String,
}

impl Form for AddGoalForm {
    type Request = CreateGoalRequest;

    fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("Please enter a goal name");
        }
        if parse_positive(&self.target_amount).is_none() {
            return Some("Target amount must be greater than 0");
        }
        if self.category.is_none() {
            return Some("Please select a category");
        }
        if !self.deadline.trim().is_empty() && parse_date(&self.deadline).is_none() {
            return Some("Please enter a valid deadline");
        }
        None
    }

    fn build(&self) -> Option<CreateGoalRequest> {
        let category = self.category.clone()?;
        Some(CreateGoalRequest {
            name: self.name.trim().to_string(),
            target_amount: parse_positive(&self.target_amount)?,
            icon: Some(category.icon.clone()),
            color: Some(category.color.clone()),
            category,
            deadline: parse_date(&self.deadline),
            asset_id: self.asset_id.clone(),
            note: optional_text(&self.note),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributionInput {
    pub goal_id: String,
    pub amount: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddContributionForm {
    pub goal_id: String,
    pub amount: String,
    pub note: String,
}

impl AddContributionForm {
    pub fn for_goal(goal_id: &str) -> Self {
        Self {
            goal_id: goal_id.to_string(),
            ..Self::default()
        }
    }
}

impl Form for AddContributionForm {
    type Request = ContributionInput;

    fn validation_error(&self) -> Option<&'static str> {
        if parse_positive(&self.amount).is_none() {
            return Some("Amount must be greater than 0");
        }
        None
    }

    fn build(&self) -> Option<ContributionInput> {
        Some(ContributionInput {
            goal_id: self.goal_id.clone(),
            amount: parse_positive(&self.amount)?,
            note: optional_text(&self.note),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacation() -> GoalCategory {
        GoalCategory {
            id: "gc-vacation".to_string(),
            name: "Vacation".to_string(),
            icon: "plane".to_string(),
            color: "#2196F3".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_goal_rules_in_order() {
        let mut form = AddGoalForm::default();
        assert_eq!(form.validation_error(), Some("Please enter a goal name"));

        form.name = "Bali".to_string();
        form.target_amount = "0".to_string();
        assert_eq!(form.validation_error(), Some("Target amount must be greater than 0"));

        form.target_amount = "5,000,000".to_string();
        assert_eq!(form.validation_error(), Some("Please select a category"));

        form.category = Some(vacation());
        form.deadline = "next year".to_string();
        assert_eq!(form.validation_error(), Some("Please enter a valid deadline"));

        form.deadline = "2027-06-01".to_string();
        let request = form.submit().unwrap();
        assert_eq!(request.target_amount, 5_000_000.0);
        assert_eq!(request.deadline, NaiveDate::from_ymd_opt(2027, 6, 1));
        assert_eq!(request.icon.as_deref(), Some("plane"));
        assert_eq!(request.note, None);
    }

    #[test]
    fn test_contribution_note_is_trimmed() {
        let mut form = AddContributionForm::for_goal("g1");
        assert!(!form.is_valid());

        form.amount = "250".to_string();
        form.note = "  bonus ".to_string();
        let input = form.submit().unwrap();
        assert_eq!(input.goal_id, "g1");
        assert_eq!(input.note.as_deref(), Some("bonus"));
    }
}
