//! Authentication and profile models

use serde::{Deserialize, Serialize};

/// Outcome of a password or federated login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub token: String,
    /// `None` when the account has not picked a currency yet
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyOption {
    pub code: String,
    pub symbol: String,
    pub name: String,
}

impl CurrencyOption {
    pub fn new(code: &str, symbol: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub currency: String,
}

impl UserProfile {
    /// First word of the name, "User" when the name is blank
    pub fn nickname(&self) -> String {
        self.name
            .split_whitespace()
            .next()
            .unwrap_or("User")
            .to_string()
    }
}
