//! Assets, net worth and asset transactions

use crate::cache::{CachedValue, Clock};
use crate::error::{failure_message, CashaError};
use crate::models::{
    Asset, AssetTransaction, CreateAssetRequest, CreateAssetTransactionRequest, PortfolioSummary,
    UpdateAssetRequest,
};
use crate::scope::TaskScope;
use crate::state::{StateContainer, StateObserver};
use crate::usecase::PortfolioUseCases;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortfolioAction {
    AssetCreated,
    AssetUpdated,
    AssetDeleted,
    TransactionAdded,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioUiState {
    pub assets: Vec<Asset>,
    pub summary: Option<PortfolioSummary>,
    pub total_expenses: f64,
    /// Asset whose transactions are listed in `transactions`
    pub selected_asset_id: Option<String>,
    pub transactions: Vec<AssetTransaction>,
    pub is_loading: bool,
    pub is_summary_loading: bool,
    pub is_transaction_loading: bool,
    pub completed: Option<PortfolioAction>,
    pub error_message: Option<String>,
}

impl PortfolioUiState {
    pub fn total_assets(&self) -> f64 {
        self.summary.as_ref().map_or(0.0, |s| s.total_assets)
    }

    /// Assets minus recorded spending
    pub fn real_balance(&self) -> f64 {
        self.total_assets() - self.total_expenses
    }
}

fn validate_asset(request: &CreateAssetRequest) -> Option<&'static str> {
    if request.name.trim().is_empty() {
        return Some("Asset name cannot be empty");
    }
    if request.asset_type.is_quantity_based() {
        let quantity = request.quantity.unwrap_or(0.0);
        let price = request.price_per_unit.unwrap_or(0.0);
        if quantity <= 0.0 || price <= 0.0 {
            return Some("Quantity and price must be greater than 0");
        }
    } else if request.amount.unwrap_or(0.0) <= 0.0 {
        return Some("Amount must be greater than 0");
    }
    None
}

#[derive(Clone)]
pub struct PortfolioViewModel {
    state: StateContainer<PortfolioUiState>,
    portfolio: Arc<dyn PortfolioUseCases>,
    summary_cache: Arc<CachedValue<PortfolioSummary>>,
    scope: TaskScope,
}

impl PortfolioViewModel {
    pub fn new(
        portfolio: Arc<dyn PortfolioUseCases>,
        scope: TaskScope,
        clock: Arc<dyn Clock>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            state: StateContainer::new(PortfolioUiState::default()),
            portfolio,
            summary_cache: Arc::new(CachedValue::new(cache_ttl, clock)),
            scope,
        }
    }

    pub fn state(&self) -> PortfolioUiState {
        self.state.read()
    }

    pub fn subscribe(&self) -> StateObserver<PortfolioUiState> {
        self.state.subscribe()
    }

    pub fn fetch_assets(&self) {
        self.start_loading();
        let this = self.clone();
        self.scope.launch("fetch_assets", async move {
            match this.portfolio.assets().await {
                Ok(assets) => {
                    debug!(count = assets.len(), "Assets loaded");
                    this.state.update(|s| {
                        s.assets = assets;
                        s.is_loading = false;
                    });
                }
                Err(err) => this.fail(&err, "Failed to fetch assets"),
            }
        });
    }

    /// Skipped entirely while the cached summary is fresh, unless `force`
    pub fn fetch_portfolio_summary(&self, force: bool) {
        if !force {
            if let Some(summary) = self.summary_cache.fresh() {
                debug!("Portfolio summary still fresh");
                self.state.update(|s| s.summary = Some(summary));
                return;
            }
        }

        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            s.is_summary_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("fetch_portfolio_summary", async move {
            let result = this
                .summary_cache
                .get(force, || this.portfolio.portfolio_summary())
                .await;
            match result {
                Ok(summary) => {
                    debug!(total = summary.total_assets, "Portfolio summary loaded");
                    this.state.update(|s| {
                        s.summary = Some(summary);
                        s.is_summary_loading = false;
                    });
                }
                Err(err) => {
                    warn!(error = %err, "Portfolio summary failed");
                    let message = failure_message(&err, "Failed to fetch portfolio summary");
                    this.state.update(|s| {
                        s.is_summary_loading = false;
                        s.error_message = Some(message);
                    });
                }
            }
        });
    }

    pub fn fetch_total_expenses(&self) {
        let this = self.clone();
        self.scope.launch("fetch_total_expenses", async move {
            match this.portfolio.total_expenses().await {
                Ok(total) => {
                    this.state.update(|s| s.total_expenses = total);
                }
                Err(err) => {
                    warn!(error = %err, "Total expenses failed");
                    let message = failure_message(&err, "Failed to fetch expenses");
                    this.state.update(|s| s.error_message = Some(message));
                }
            }
        });
    }

    pub fn fetch_asset_transactions(&self, asset_id: &str) {
        let asset_id = asset_id.to_string();

        if self.scope.is_shut_down() {
            return;
        }

        self.state.update(|s| {
            if s.selected_asset_id.as_deref() != Some(asset_id.as_str()) {
                s.transactions.clear();
            }
            s.selected_asset_id = Some(asset_id.clone());
            s.is_transaction_loading = true;
            s.error_message = None;
        });

        let this = self.clone();
        self.scope.launch("fetch_asset_transactions", async move {
            match this.portfolio.asset_transactions(&asset_id).await {
                Ok(transactions) => {
                    this.state.update(|s| {
                        if s.selected_asset_id.as_deref() == Some(asset_id.as_str()) {
                            s.transactions = transactions;
                        }
                        s.is_transaction_loading = false;
                    });
                }
                Err(err) => {
                    warn!(error = %err, asset_id = %asset_id, "Asset transactions failed");
                    let message = failure_message(&err, "Failed to fetch transactions");
                    this.state.update(|s| {
                        s.is_transaction_loading = false;
                        s.error_message = Some(message);
                    });
                }
            }
        });
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
        warn!(error = %err, action = fallback, "Portfolio action failed");
        let message = failure_message(err, fallback);
        self.state.update(|s| {
            s.is_loading = false;
            s.error_message = Some(message);
        });
    }

    pub fn create_asset(&self, request: CreateAssetRequest) {
        if let Some(message) = validate_asset(&request) {
            return self.reject(message);
        }

        self.start_loading();
        let this = self.clone();
        self.scope.launch("create_asset", async move {
            match this.portfolio.create_asset(request).await {
                Ok(asset) => {
                    info!(asset_id = %asset.id, asset_type = ?asset.asset_type, "Asset created");
                    this.state.update(|s| {
                        s.assets.push(asset);
                        s.is_loading = false;
                        s.completed = Some(PortfolioAction::AssetCreated);
                    });
                    this.fetch_portfolio_summary(true);
                }
                Err(err) => this.fail(&err, "Failed to create asset"),
            }
        });
    }

    pub fn update_asset(&self, asset_id: &str, request: UpdateAssetRequest) {
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return self.reject("Asset name cannot be empty");
            }
        }
        if let Some(amount) = request.amount {
            if amount <= 0.0 {
                return self.reject("Amount must be greater than 0");
            }
        }

        self.start_loading();
        let asset_id = asset_id.to_string();
        let this = self.clone();
        self.scope.launch("update_asset", async move {
            match this.portfolio.update_asset(&asset_id, request).await {
                Ok(asset) => {
                    info!(asset_id = %asset.id, amount = asset.amount, "Asset updated");
                    this.state.update(|s| {
                        if let Some(slot) = s.assets.iter_mut().find(|a| a.id == asset.id) {
                            *slot = asset;
                        }
                        s.is_loading = false;
                        s.completed = Some(PortfolioAction::AssetUpdated);
                    });
                    this.fetch_portfolio_summary(true);
                }
                Err(err) => this.fail(&err, "Failed to update asset"),
            }
        });
    }

    pub fn delete_asset(&self, asset_id: &str) {
        self.start_loading();
        let asset_id = asset_id.to_string();
        let this = self.clone();
        self.scope.launch("delete_asset", async move {
            match this.portfolio.delete_asset(&asset_id).await {
                Ok(()) => {
                    info!(asset_id = %asset_id, "Asset deleted");
                    this.state.update(|s| {
                        s.assets.retain(|a| a.id != asset_id);
                        if s.selected_asset_id.as_deref() == Some(asset_id.as_str()) {
                            s.selected_asset_id = None;
                            s.transactions.clear();
                        }
                        s.is_loading = false;
                        s.completed = Some(PortfolioAction::AssetDeleted);
                    });
                    this.fetch_portfolio_summary(true);
                }
                Err(err) => this.fail(&err, "Failed to delete asset"),
            }
        });
    }

    /// Refreshes the assets, this asset's transactions and the summary
    pub fn add_asset_transaction(&self, asset_id: &str, request: CreateAssetTransactionRequest) {
        if request.total() <= 0.0 {
            return self.reject("Amount must be greater than 0");
        }

        self.start_loading();
        let asset_id = asset_id.to_string();
        let this = self.clone();
        self.scope.launch("add_asset_transaction", async move {
            match this.portfolio.add_asset_transaction(&asset_id, request).await {
                Ok(transaction) => {
                    info!(asset_id = %asset_id, total = transaction.total_amount, "Asset transaction added");
                    this.state.update(|s| {
                        s.is_loading = false;
                        s.completed = Some(PortfolioAction::TransactionAdded);
                    });
                    this.fetch_assets();
                    this.fetch_asset_transactions(&asset_id);
                    this.fetch_portfolio_summary(true);
                }
                Err(err) => this.fail(&err, "Failed to add transaction"),
            }
        });
    }

    pub fn take_completed(&self) -> Option<PortfolioAction> {
        let mut taken = None;
        self.state.update(|s| taken = s.completed.take());
        taken
    }

    /// Forget everything, including the cached summary
    pub fn clear_data(&self) {
        self.summary_cache.invalidate();
        self.state.replace(PortfolioUiState::default());
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error_message = None);
    }
}
