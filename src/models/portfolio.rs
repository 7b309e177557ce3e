//! Asset and portfolio models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Cash,
    SavingsAccount,
    CheckingAccount,
    Deposit,
    Stock,
    MutualFund,
    Etf,
    BondGovernment,
    BondCorporate,
    Sukuk,
    GoldPhysical,
    GoldDigital,
    SilverPhysical,
    Cryptocurrency,
    Land,
    ResidentialProperty,
    CommercialProperty,
    VehicleCar,
    VehicleMotorcycle,
    VehicleOther,
    BusinessOwnership,
    InsuranceCashValue,
    PensionFund,
    Receivables,
    Other,
}

impl AssetType {
    /// Tracked as quantity x price instead of a single amount
    pub fn is_quantity_based(&self) -> bool {
        use AssetType::*;
        matches!(
            self,
            Stock
                | MutualFund
                | Etf
                | BondGovernment
                | BondCorporate
                | Sukuk
                | GoldPhysical
                | GoldDigital
                | SilverPhysical
                | Cryptocurrency
                | Land
        )
    }

    pub fn recommended_unit(&self) -> Option<&'static str> {
        use AssetType::*;
        match self {
            GoldPhysical | GoldDigital | SilverPhysical => Some("gram"),
            Stock => Some("lot"),
            MutualFund | Etf => Some("unit"),
            Cryptocurrency => Some("coin"),
            Land => Some("m²"),
            BondGovernment | BondCorporate | Sukuk => Some("lembar"),
            ResidentialProperty | CommercialProperty | VehicleCar | VehicleMotorcycle
            | VehicleOther => Some("unit"),
            BusinessOwnership => Some("%"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub amount: f64,
    pub currency: String,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBreakdown {
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub amount: f64,
    pub count: usize,
}

impl AssetBreakdown {
    pub fn percentage_of(&self, total: f64) -> f64 {
        if total <= 0.0 {
            0.0
        } else {
            self.amount / total * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub currency: String,
    pub total_assets: f64,
    pub breakdown: Vec<AssetBreakdown>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateAssetRequest {
    pub amount: Option<f64>,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetTransactionType {
    Saving,
    Withdraw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTransaction {
    pub id: String,
    pub asset_id: String,
    #[serde(rename = "type")]
    pub transaction_type: AssetTransactionType,
    pub quantity: Option<f64>,
    pub price_per_unit: Option<f64>,
    pub total_amount: f64,
    pub note: Option<String>,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAssetTransactionRequest {
    #[serde(rename = "type")]
    pub transaction_type: AssetTransactionType,
    pub quantity: Option<f64>,
    pub price_per_unit: Option<f64>,
    pub amount: Option<f64>,
    pub datetime: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl CreateAssetTransactionRequest {
    /// Monetary value of the transaction
    pub fn total(&self) -> f64 {
        match (self.quantity, self.price_per_unit) {
            (Some(quantity), Some(price)) => quantity * price,
            _ => self.amount.unwrap_or(0.0),
        }
    }
}
