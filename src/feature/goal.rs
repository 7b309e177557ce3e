//! Savings goals

use crate::error::{failure_message, CashaError};
use crate::models::{CreateGoalRequest, Goal, GoalCategory, GoalSummary};
use crate::scope::TaskScope;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::GoalUseCases;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoalAction {
    Created,
    Updated,
    Deleted,
    ContributionAdded,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalTrackerUiState {
    pub goals: Vec<Goal>,
    pub summary: Option<GoalSummary>,
    pub categories: Vec<GoalCategory>,
    pub selected_goal: Option<Goal>,
    pub is_loading: bool,
    pub is_detail_loading: bool,
    pub completed: Option<GoalAction>,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct GoalTrackerViewModel {
    state: StateContainer<GoalTrackerUiState>,
    goals: Arc<dyn GoalUseCases>,
    scope: TaskScope,
}

impl GoalTrackerViewModel {
    /// Starts loading goals and categories right away
    pub fn new(goals: Arc<dyn GoalUseCases>, scope: TaskScope) -> Self {
        let vm = Self {
            state: StateContainer::new(GoalTrackerUiState::default()),
            goals,
            scope,
        };
        vm.fetch_all_data();
        vm.fetch_categories();
        vm
    }

    pub fn state(&self) -> GoalTrackerUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<GoalTrackerUiState> {
        self.state.subscribe()
    }

    /// Goals and their summary, fetched together
    pub fn fetch_all_data(&self) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("fetch_all_data", async move {
            let (goals, summary) = tokio::join!(this.goals.goals(), this.goals.goal_summary());
            match goals.and_then(|goals| summary.map(|summary| (goals, summary))) {
                Ok((goals, summary)) => {
                    debug!(count = goals.len(), "Goals loaded");
                    this.state.update(|s| {
                        s.goals = goals;
                        s.summary = Some(summary);
                        s.is_loading = false;
                    });
                }
                Err(err) => this.fail(&err, "Failed to fetch goals"),
            }
        });
    }

    /// Failures are only logged; the picker falls back to an empty list
    fn fetch_categories(&self) {
        let this = self.clone();
        self.scope.launch("fetch_categories", async move {
            match this.goals.goal_categories().await {
                Ok(categories) => {
                    let active: Vec<GoalCategory> =
                        categories.into_iter().filter(|c| c.is_active).collect();
                    this.state.update(|s| s.categories = active);
                }
                Err(err) => debug!(error = %err, "Goal categories unavailable"),
            }
        });
    }

    pub fn fetch_goal_details(&self, goal_id: &str) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_detail_loading = true;
            s.error_message = None;
        });

        let goal_id = goal_id.to_string();
        let this = self.clone();
        self.scope.launch("fetch_goal_details", async move {
            match this.goals.goal(&goal_id).await {
                Ok(goal) => this.state.update(|s| {
                    s.selected_goal = Some(goal);
                    s.is_detail_loading = false;
                }),
                Err(err) => {
                    warn!(error = %err, goal_id = %goal_id, "Goal details failed");
                    let message = failure_message(&err, "Failed to fetch goal details");
                    this.state.update(|s| {
                        s.is_detail_loading = false;
                        s.error_message = Some(message);
                    })
                }
            };
        });
    }

    fn validate(request: &CreateGoalRequest) -> Option<&'static str> {
        if request.name.trim().is_empty() {
            return Some("Please enter a goal name");
        }
        if request.target_amount <= 0.0 {
            return Some("Target amount must be greater than 0");
        }
        None
    }

    fn reject(&self, message: &str) {
        self.state.update(|s| s.error_message = Some(message.to_string()));
    }

    fn start_loading(&self) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });
    }

    fn fail(&self, err: &CashaError, fallback: &str) {
        warn!(error = %err, action = fallback, "Goal action failed");
        let message = failure_message(err, fallback);
        self.state.update(|s| {
            s.is_loading = false;
            s.error_message = Some(message);
        });
    }

    fn succeed(&self, action: GoalAction) {
        self.state.update(|s| {
            s.is_loading = false;
            s.completed = Some(action);
        });
        self.fetch_all_data();
    }

    pub fn create_goal(&self, request: CreateGoalRequest) {
        if let Some(message) = Self::validate(&request) {
            return self.reject(message);
        }

        self.start_loading();
        let this = self.clone();
        self.scope.launch("create_goal", async move {
            match this.goals.create_goal(request).await {
                Ok(goal) => {
                    info!(goal_id = %goal.id, name = %goal.name, "Goal created");
                    this.succeed(GoalAction::Created);
                }
                Err(err) => this.fail(&err, "Failed to create goal"),
            }
        });
    }

    pub fn update_goal(&self, goal_id: &str, request: CreateGoalRequest) {
        if let Some(message) = Self::validate(&request) {
            return self.reject(message);
        }

        self.start_loading();
        let goal_id = goal_id.to_string();
        let this = self.clone();
        self.scope.launch("update_goal", async move {
            match this.goals.update_goal(&goal_id, request).await {
                Ok(goal) => {
                    info!(goal_id = %goal.id, "Goal updated");
                    this.state.update(|s| {
                        if s.selected_goal.as_ref().map(|g| &g.id) == Some(&goal.id) {
                            s.selected_goal = Some(goal);
                        }
                    });
                    this.succeed(GoalAction::Updated);
                }
                Err(err) => this.fail(&err, "Failed to update goal"),
            }
        });
    }

    pub fn delete_goal(&self, goal_id: &str) {
        self.start_loading();
        let goal_id = goal_id.to_string();
        let this = self.clone();
        self.scope.launch("delete_goal", async move {
            match this.goals.delete_goal(&goal_id).await {
                Ok(()) => {
                    info!(goal_id = %goal_id, "Goal deleted");
                    this.state.update(|s| {
                        if s.selected_goal.as_ref().map(|g| g.id.as_str()) == Some(goal_id.as_str()) {
                            s.selected_goal = None;
                        }
                    });
                    this.succeed(GoalAction::Deleted);
                }
                Err(err) => this.fail(&err, "Failed to delete goal"),
            }
        });
    }

    pub fn add_contribution(&self, goal_id: &str, amount: f64, note: Option<String>) {
        if amount <= 0.0 {
            return self.reject("Amount must be greater than 0");
        }

        self.start_loading();
        let goal_id = goal_id.to_string();
        let note = note.filter(|n| !n.trim().is_empty());
        let this = self.clone();
        self.scope.launch("add_contribution", async move {
            match this.goals.add_contribution(&goal_id, amount, note).await {
                Ok(contribution) => {
                    info!(goal_id = %goal_id, amount = contribution.amount, "Contribution added");
                    this.succeed(GoalAction::ContributionAdded);
                    this.fetch_goal_details(&goal_id);
                }
                Err(err) => this.fail(&err, "Failed to add contribution"),
            }
        });
    }

    pub fn take_completed(&self) -> Option<GoalAction> {
        let mut taken = None;
        self.state.update(|s| taken = s.completed.take());
        taken
    }

    pub fn clear_selection(&self) {
        self.state.update(|s| s.selected_goal = None);
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error_message = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::InMemoryBackend;

    async fn setup() -> (GoalTrackerViewModel, InMemoryBackend, TaskScope) {
        let backend = InMemoryBackend::default();
        let scope = TaskScope::new("goals");
        let vm = GoalTrackerViewModel::new(Arc::new(backend.clone()), scope.clone());
        scope.settle().await;
        (vm, backend, scope)
    }

    fn request(vm: &GoalTrackerViewModel, name: &str, target: f64) -> CreateGoalRequest {
        CreateGoalRequest {
            name: name.to_string(),
            target_amount: target,
            category: vm.state().categories[0].clone(),
            deadline: None,
            asset_id: None,
            icon: None,
            color: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_construction_loads_goals_and_categories() {
        let (vm, backend, _scope) = setup().await;
        assert_eq!(backend.calls("goals"), 1);
        assert_eq!(backend.calls("goal_summary"), 1);
        assert_eq!(backend.calls("goal_categories"), 1);

        let state = vm.state();
        assert_eq!(state.categories.len(), 4);
        assert_eq!(state.summary.as_ref().unwrap().total_goals, 0);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_category_failure_is_silent() {
        let backend = InMemoryBackend::default();
        backend.fail("goal_categories", "boom");
        let scope = TaskScope::new("goals");
        let vm = GoalTrackerViewModel::new(Arc::new(backend.clone()), scope.clone());
        scope.settle().await;

        let state = vm.state();
        assert!(state.categories.is_empty());
        assert_eq!(state.error_message, None);
    }

    #[tokio::test]
    async fn test_create_goal_cascades() {
        let (vm, backend, scope) = setup().await;
        backend.reset_calls();

        vm.create_goal(request(&vm, "Laptop", 15_000_000.0));
        scope.settle().await;

        let state = vm.state();
        assert_eq!(state.goals.len(), 1);
        assert_eq!(state.summary.as_ref().unwrap().total_target, 15_000_000.0);
        assert_eq!(backend.calls("goals"), 1);
        assert_eq!(backend.calls("goal_summary"), 1);
        assert_eq!(vm.take_completed(), Some(GoalAction::Created));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (vm, backend, _scope) = setup().await;

        vm.create_goal(request(&vm, " ", 100.0));
        assert_eq!(vm.state().error_message.as_deref(), Some("Please enter a goal name"));

        vm.create_goal(request(&vm, "Trip", 0.0));
        assert_eq!(
            vm.state().error_message.as_deref(),
            Some("Target amount must be greater than 0")
        );
        assert_eq!(backend.calls("create_goal"), 0);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_goals_untouched() {
        let (vm, backend, scope) = setup().await;
        backend.fail("create_goal", "");

        vm.create_goal(request(&vm, "Laptop", 100.0));
        scope.settle().await;

        let state = vm.state();
        assert!(state.goals.is_empty());
        assert!(!state.is_loading);
        assert_eq!(state.error_message.as_deref(), Some("Failed to create goal"));
        assert_eq!(state.completed, None);
    }

    #[tokio::test]
    async fn test_contribution_refreshes_details() {
        let (vm, backend, scope) = setup().await;
        vm.create_goal(request(&vm, "Laptop", 100.0));
        scope.settle().await;
        let goal_id = vm.state().goals[0].id.clone();

        vm.fetch_goal_details(&goal_id);
        scope.settle().await;
        backend.reset_calls();

        vm.add_contribution(&goal_id, 40.0, Some(" ".to_string()));
        scope.settle().await;

        let state = vm.state();
        assert_eq!(backend.calls("goal"), 1);
        assert_eq!(backend.calls("goals"), 1);
        assert_eq!(state.selected_goal.as_ref().unwrap().current_amount, 40.0);
        assert_eq!(state.goals[0].current_amount, 40.0);
    }

    #[tokio::test]
    async fn test_non_positive_contribution_rejected() {
        let (vm, backend, _scope) = setup().await;
        vm.add_contribution("g-1", 0.0, None);
        assert_eq!(vm.state().error_message.as_deref(), Some("Amount must be greater than 0"));
        assert_eq!(backend.calls("add_contribution"), 0);
    }

    #[tokio::test]
    async fn test_delete_clears_selection() {
        let (vm, _backend, scope) = setup().await;
        vm.create_goal(request(&vm, "Laptop", 100.0));
        scope.settle().await;
        let goal_id = vm.state().goals[0].id.clone();
        vm.fetch_goal_details(&goal_id);
        scope.settle().await;

        vm.delete_goal(&goal_id);
        scope.settle().await;

        let state = vm.state();
        assert!(state.selected_goal.is_none());
        assert!(state.goals.is_empty());
    }

    #[tokio::test]
    async fn test_details_failure_fallback() {
        let (vm, _backend, scope) = setup().await;
        vm.fetch_goal_details("missing");
        scope.settle().await;

        let state = vm.state();
        assert!(!state.is_detail_loading);
        assert_eq!(state.error_message.as_deref(), Some("Not found: goal missing"));
    }
}
