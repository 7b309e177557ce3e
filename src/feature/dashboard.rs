//! Dashboard aggregate: spending, cashflow, goals and sync status
//!
//! One refresh fans out to every source in parallel and applies the result
//! in a single snapshot update. Refreshes are throttled unless forced; the
//! background push of local transactions is throttled separately.

use crate::cache::Clock;
use crate::error::{failure_message, CashaError};
use crate::models::{
    CashflowEntry, CashflowFilter, CashflowSummary, ChartBar, ChartTab, Goal, GoalSummary, Page,
    SpendingPeriod, SpendingReport,
};
use crate::scope::TaskScope;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::{DashboardUseCases, GoalUseCases, ProfileUseCases, TransactionUseCases};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

const REFRESH_INTERVAL: Duration = Duration::from_secs(5);
const AUTO_SYNC_INTERVAL: Duration = Duration::from_secs(30);
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardUiState {
    pub recent_transactions: Vec<CashflowEntry>,
    pub total_spending: f64,
    pub report: SpendingReport,
    pub cashflow_summary: Option<CashflowSummary>,
    pub unsynced_count: usize,
    pub is_online: bool,
    pub is_syncing: bool,
    pub selected_period: SpendingPeriod,
    /// First word of the profile name
    pub nickname: String,
    pub goals: Vec<Goal>,
    pub goal_summary: Option<GoalSummary>,
    pub selected_chart_tab: ChartTab,
    pub error_message: Option<String>,
}

impl Default for DashboardUiState {
    fn default() -> Self {
        Self {
            recent_transactions: Vec::new(),
            total_spending: 0.0,
            report: SpendingReport::default(),
            cashflow_summary: None,
            unsynced_count: 0,
            is_online: false,
            is_syncing: false,
            selected_period: SpendingPeriod::default(),
            nickname: "User".to_string(),
            goals: Vec::new(),
            goal_summary: None,
            selected_chart_tab: ChartTab::default(),
            error_message: None,
        }
    }
}

impl DashboardUiState {
    /// Bars of the selected chart tab
    pub fn chart_bars(&self) -> &[ChartBar] {
        match self.selected_chart_tab {
            ChartTab::Week => &self.report.daily_bars,
            ChartTab::Month => &self.report.weekly_bars,
        }
    }
}

struct Snapshot {
    total_spending: f64,
    report: SpendingReport,
    unsynced_count: usize,
    recent: Vec<CashflowEntry>,
    summary: CashflowSummary,
    goals: Vec<Goal>,
    goal_summary: GoalSummary,
}

#[derive(Default)]
struct Throttle {
    last_refresh: Option<DateTime<Utc>>,
    last_auto_sync: Option<DateTime<Utc>>,
}

/// True and restamped when `last` is empty or at least `interval` old
fn elapsed(last: &mut Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> bool {
    let due = match last {
        Some(at) => (now - *at).to_std().map_or(true, |age| age >= interval),
        None => true,
    };
    if due {
        *last = Some(now);
    }
    due
}

#[derive(Clone)]
pub struct DashboardViewModel {
    state: StateContainer<DashboardUiState>,
    dashboard: Arc<dyn DashboardUseCases>,
    transactions: Arc<dyn TransactionUseCases>,
    goals: Arc<dyn GoalUseCases>,
    profile: Arc<dyn ProfileUseCases>,
    clock: Arc<dyn Clock>,
    throttle: Arc<Mutex<Throttle>>,
    scope: TaskScope,
}

impl DashboardViewModel {
    /// Loads the nickname, then forces the first refresh
    pub fn new(
        dashboard: Arc<dyn DashboardUseCases>,
        transactions: Arc<dyn TransactionUseCases>,
        goals: Arc<dyn GoalUseCases>,
        profile: Arc<dyn ProfileUseCases>,
        clock: Arc<dyn Clock>,
        scope: TaskScope,
    ) -> Self {
        let vm = Self {
            state: StateContainer::new(DashboardUiState::default()),
            dashboard,
            transactions,
            goals,
            profile,
            clock,
            throttle: Arc::new(Mutex::new(Throttle::default())),
            scope,
        };
        vm.load_initial_data();
        vm
    }

    pub fn state(&self) -> DashboardUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<DashboardUiState> {
        self.state.subscribe()
    }

    fn load_initial_data(&self) {
        let this = self.clone();
        self.scope.launch("load_initial_data", async move {
            match this.profile.profile().await {
                Ok(profile) => {
                    let nickname = profile.nickname();
                    this.state.update(|s| s.nickname = nickname);
                }
                // The greeting keeps its default
                Err(err) => warn!(error = %err, "Profile load failed"),
            }
            this.refresh_dashboard(true);
        });
    }

    /// Ignored within five seconds of the previous refresh unless `force`
    pub fn refresh_dashboard(&self, force: bool) {
        if self.scope.is_shut_down() {
            return;
        }
        {
            let now = self.clock.now();
            let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
            let due = elapsed(&mut throttle.last_refresh, now, REFRESH_INTERVAL);
            if !due && !force {
                debug!("Dashboard refreshed recently");
                return;
            }
            throttle.last_refresh = Some(now);
        }

        self.state.update(|s| {
            s.is_syncing = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("refresh_dashboard", async move {
            match this.load().await {
                Ok(snapshot) => {
                    debug!(
                        recent = snapshot.recent.len(),
                        unsynced = snapshot.unsynced_count,
                        "Dashboard refreshed"
                    );
                    this.state.update(|s| {
                        s.total_spending = snapshot.total_spending;
                        s.report = snapshot.report;
                        s.unsynced_count = snapshot.unsynced_count;
                        s.recent_transactions = snapshot.recent;
                        s.cashflow_summary = Some(snapshot.summary);
                        s.goals = snapshot.goals;
                        s.goal_summary = Some(snapshot.goal_summary);
                        s.is_syncing = false;
                    });
                }
                Err(err) => this.fail(&err, "Failed to refresh dashboard"),
            }
        });
    }

    async fn load(&self) -> Result<Snapshot> {
        let (period, online) = self.state.with(|s| (s.selected_period, s.is_online));
        let today = self.clock.now().date_naive();
        let filter = period.filter(today);

        if online {
            self.dashboard.sync_cashflow().await?;
        }

        let (total_spending, report, unsynced_count, recent, summary, goals, goal_summary) = tokio::join!(
            self.dashboard.total_spending(&filter),
            self.dashboard.spending_report(today),
            self.dashboard.unsynced_count(),
            self.recent_entries(online, &filter),
            self.summary(online, &filter),
            self.goals.goals(),
            self.goals.goal_summary(),
        );

        Ok(Snapshot {
            total_spending: total_spending?,
            report: report?,
            unsynced_count: unsynced_count?,
            recent: recent?,
            summary: summary?,
            goals: goals?,
            goal_summary: goal_summary?,
        })
    }

    /// Remote history while online, newest local transactions otherwise
    async fn recent_entries(&self, online: bool, filter: &CashflowFilter) -> Result<Vec<CashflowEntry>> {
        if online {
            let page = Page {
                page: 1,
                page_size: RECENT_LIMIT as u32,
            };
            return self.transactions.cashflow_history(filter, page).await;
        }

        let mut local = self.transactions.transactions().await?;
        local.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(local.iter().take(RECENT_LIMIT).map(|t| t.to_entry()).collect())
    }

    async fn summary(&self, online: bool, filter: &CashflowFilter) -> Result<CashflowSummary> {
        if online {
            self.dashboard.cashflow_summary(filter).await
        } else {
            self.dashboard.local_cashflow_summary(filter).await
        }
    }

    fn fail(&self, err: &CashaError, fallback: &str) {
        warn!(error = %err, action = fallback, "Dashboard action failed");
        let message = failure_message(err, fallback);
        self.state.update(|s| {
            s.is_syncing = false;
            s.error_message = Some(message);
        });
    }

    /// Pull remote cashflow, then force a refresh
    pub fn sync_data(&self) {
        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| s.is_syncing = true);
        let this = self.clone();
        self.scope.launch("sync_data", async move {
            match this.dashboard.sync_cashflow().await {
                Ok(()) => this.refresh_dashboard(true),
                Err(err) => this.fail(&err, "Sync failed"),
            }
        });
    }

    /// Push local transactions and sync, at most once every thirty seconds
    pub fn trigger_auto_sync(&self) {
        if self.scope.is_shut_down() {
            return;
        }
        {
            let now = self.clock.now();
            let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
            if !elapsed(&mut throttle.last_auto_sync, now, AUTO_SYNC_INTERVAL) {
                debug!("Auto-sync attempted recently");
                return;
            }
        }

        self.state.update(|s| s.is_syncing = true);
        let this = self.clone();
        self.scope.launch("trigger_auto_sync", async move {
            match this.transactions.sync_transactions().await {
                Ok(()) => {
                    info!("Local transactions pushed");
                    this.sync_data();
                }
                Err(err) => this.fail(&err, "Auto-sync failed"),
            }
        });
    }

    /// Coming online triggers an auto-sync
    pub fn set_online(&self, online: bool) {
        self.state.update(|s| s.is_online = online);
        if online {
            self.trigger_auto_sync();
        }
    }

    /// Follow connectivity changes until the sender goes away
    pub fn watch_network(&self, mut network: watch::Receiver<bool>) {
        let this = self.clone();
        self.scope.launch("watch_network", async move {
            loop {
                let online = *network.borrow_and_update();
                debug!(online, "Connectivity changed");
                this.set_online(online);
                if network.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    /// Force a refresh whenever another screen reports changed cashflow data
    pub fn watch_sync_events(&self, mut events: broadcast::Receiver<()>) {
        let this = self.clone();
        self.scope.launch("watch_sync_events", async move {
            loop {
                match events.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        this.refresh_dashboard(true)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    pub fn change_period(&self, period: SpendingPeriod) {
        self.state.update(|s| s.selected_period = period);
        self.refresh_dashboard(true);
    }

    pub fn change_chart_tab(&self, tab: ChartTab) {
        self.state.update(|s| s.selected_chart_tab = tab);
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error_message = None);
    }
}
