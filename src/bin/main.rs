use casha_state::{
    config::AppConfig,
    feature::{
        DashboardViewModel, LiabilityViewModel, LoginViewModel, PortfolioViewModel, SyncEvents,
        TransactionViewModel,
    },
    form::{CreateAssetForm, CreateLiabilityForm, Form},
    models::{AssetType, LiabilityCategory, TransactionRequest},
    session::InMemoryAuthManager,
    usecase::InMemoryBackend,
    Result, SystemClock, TaskScope,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    info!(cache_ttl_ms = config.cache_ttl.as_millis() as u64, "Casha demo starting");

    // Create components
    let backend = Arc::new(InMemoryBackend::new(config.default_currency.clone()));
    let session = Arc::new(InMemoryAuthManager::new());
    let clock = Arc::new(SystemClock);
    let scope = TaskScope::new("demo");

    backend
        .add_account("demo@casha.app", "secret123", Some(config.default_currency.as_str()))
        .await;

    // Sign in
    let login = LoginViewModel::new(backend.clone(), session.clone(), scope.clone());
    login.on_email_change("demo@casha.app");
    login.on_password_change("secret123");
    login.login();
    scope.settle().await;

    let login_state = login.state();
    if !login_state.is_logged_in {
        warn!(error = ?login_state.error_message, "Sign-in did not complete");
        scope.shutdown().await;
        return Ok(());
    }

    let liabilities =
        LiabilityViewModel::new(backend.clone(), scope.clone(), clock.clone(), config.cache_ttl);
    let portfolio =
        PortfolioViewModel::new(backend.clone(), scope.clone(), clock.clone(), config.cache_ttl);
    let transactions =
        TransactionViewModel::new(backend.clone(), SyncEvents::new(), clock.clone(), scope.clone());
    let dashboard = DashboardViewModel::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        clock,
        scope.clone(),
    );

    // Record a credit card and a gold holding through their forms
    let card = CreateLiabilityForm {
        name: "Everyday Card".to_string(),
        bank_name: "BCA".to_string(),
        credit_limit: "20000000".to_string(),
        current_balance: "3500000".to_string(),
        interest_rate: "1.75".to_string(),
        billing_day: "5".to_string(),
        due_day: "20".to_string(),
        ..CreateLiabilityForm::new(LiabilityCategory::CreditCard)
    };
    if let Some(request) = card.submit() {
        liabilities.create_liability(request);
    }

    let mut gold = CreateAssetForm::new(AssetType::GoldPhysical);
    gold.name = "Antam bars".to_string();
    gold.quantity = "10".to_string();
    gold.price_per_unit = "1250000".to_string();
    if let Some(request) = gold.submit() {
        portfolio.create_asset(request);
    }

    transactions.add_transaction(TransactionRequest {
        name: "Groceries".to_string(),
        category: "Food".to_string(),
        amount: 425_000.0,
        datetime: chrono::Utc::now(),
        note: None,
    });

    portfolio.fetch_total_expenses();
    scope.settle().await;
    dashboard.refresh_dashboard(true);
    scope.settle().await;

    println!("\n=== LIABILITIES ===");
    println!("{}", serde_json::to_string_pretty(&liabilities.state())?);
    println!("\n=== PORTFOLIO ===");
    println!("{}", serde_json::to_string_pretty(&portfolio.state())?);
    println!("\n=== DASHBOARD ===");
    println!("{}", serde_json::to_string_pretty(&dashboard.state())?);

    scope.shutdown().await;
    info!("Casha demo finished");
    Ok(())
}
