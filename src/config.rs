//! Runtime configuration
//!
//! Values come from the process environment; a `.env` file is honoured by the
//! binary before `AppConfig::from_env` runs.

use crate::error::CashaError;
use crate::Result;
use std::time::Duration;

/// Validity window of cached summaries (5 minutes)
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;
pub const DEFAULT_CURRENCY: &str = "IDR";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub cache_ttl: Duration,
    pub default_currency: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            default_currency: DEFAULT_CURRENCY.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (lets tests avoid touching process env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(raw) = lookup("CASHA_CACHE_TTL_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                CashaError::Config(format!("CASHA_CACHE_TTL_MS is not a number: {}", raw))
            })?;
            config.cache_ttl = Duration::from_millis(millis);
        }

        if let Some(currency) = lookup("CASHA_DEFAULT_CURRENCY") {
            let currency = currency.trim().to_uppercase();
            if currency.len() != 3 {
                return Err(CashaError::Config(format!(
                    "CASHA_DEFAULT_CURRENCY must be a 3-letter code, got {}",
                    currency
                )));
            }
            config.default_currency = currency;
        }

        if let Some(filter) = lookup("CASHA_LOG") {
            if !filter.trim().is_empty() {
                config.log_filter = filter.trim().to_string();
            }
        }

        Ok(config)
    }
}
