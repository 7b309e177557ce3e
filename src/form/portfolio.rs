//! Asset sheets
//!
//! Quantity-based assets (stocks, gold, crypto, land) are entered as
//! quantity and unit price; everything else as a single amount.

use super::goal::parse_date;
use super::{optional_text, parse_positive, Form};
use crate::models::{
    Asset, AssetTransactionType, AssetType, CreateAssetRequest, CreateAssetTransactionRequest,
    UpdateAssetRequest,
};

const EMPTY_NAME: &str = "Asset name cannot be empty";
const QUANTITY_AND_PRICE: &str = "Quantity and price must be greater than 0";
const AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than 0";

fn valuation_error(asset_type: AssetType, amount: &str, quantity: &str, price: &str) -> Option<&'static str> {
    if asset_type.is_quantity_based() {
        if parse_positive(quantity).is_none() || parse_positive(price).is_none() {
            return Some(QUANTITY_AND_PRICE);
        }
    } else if parse_positive(amount).is_none() {
        return Some(AMOUNT_NOT_POSITIVE);
    }
    None
}

/// `(amount, quantity, price_per_unit)` as they will be sent
fn valuation(asset_type: AssetType, amount: &str, quantity: &str, price: &str) -> Option<(f64, f64, f64)> {
    if asset_type.is_quantity_based() {
        let quantity = parse_positive(quantity)?;
        let price = parse_positive(price)?;
        Some((quantity * price, quantity, price))
    } else {
        let amount = parse_positive(amount)?;
        Some((amount, 1.0, amount))
    }
}

fn unit_for(asset_type: AssetType, typed: &str) -> Option<String> {
    if !asset_type.is_quantity_based() {
        return None;
    }
    optional_text(typed).or_else(|| asset_type.recommended_unit().map(str::to_string))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateAssetForm {
    pub name: String,
    pub asset_type: AssetType,
    pub amount: String,
    pub quantity: String,
    pub price_per_unit: String,
    pub unit: String,
    /// `YYYY-MM-DD`, optional
    pub acquisition_date: String,
    pub location: String,
    pub description: String,
}

impl CreateAssetForm {
    pub fn new(asset_type: AssetType) -> Self {
        Self {
            name: String::new(),
            asset_type,
            amount: String::new(),
            quantity: String::new(),
            price_per_unit: String::new(),
            unit: asset_type.recommended_unit().unwrap_or_default().to_string(),
            acquisition_date: String::new(),
            location: String::new(),
            description: String::new(),
        }
    }

    /// Switching type resets the unit to the new type's recommendation
    pub fn set_asset_type(&mut self, asset_type: AssetType) {
        self.asset_type = asset_type;
        self.unit = asset_type.recommended_unit().unwrap_or_default().to_string();
    }

    /// Live total shown under the inputs
    pub fn total(&self) -> f64 {
        valuation(self.asset_type, &self.amount, &self.quantity, &self.price_per_unit)
            .map(|(amount, _, _)| amount)
            .unwrap_or(0.0)
    }
}

impl Form for CreateAssetForm {
    type Request = CreateAssetRequest;

    fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some(EMPTY_NAME);
        }
        if let Some(message) =
            valuation_error(self.asset_type, &self.amount, &self.quantity, &self.price_per_unit)
        {
            return Some(message);
        }
        if !self.acquisition_date.trim().is_empty() && parse_date(&self.acquisition_date).is_none() {
            return Some("Please enter a valid date");
        }
        None
    }

    fn build(&self) -> Option<CreateAssetRequest> {
        let (amount, quantity, price) =
            valuation(self.asset_type, &self.amount, &self.quantity, &self.price_per_unit)?;
        Some(CreateAssetRequest {
            name: self.name.trim().to_string(),
            asset_type: self.asset_type,
            amount: Some(amount),
            currency: None,
            description: optional_text(&self.description),
            quantity: Some(quantity),
            unit: unit_for(self.asset_type, &self.unit),
            price_per_unit: Some(price),
            acquisition_date: parse_date(&self.acquisition_date),
            location: optional_text(&self.location),
        })
    }
}

/// Prefilled from the asset being edited
#[derive(Debug, Clone, PartialEq)]
pub struct EditAssetForm {
    pub asset_id: String,
    pub asset_type: AssetType,
    pub name: String,
    pub amount: String,
    pub quantity: String,
    pub price_per_unit: String,
    pub unit: String,
    pub location: String,
    pub description: String,
}

impl EditAssetForm {
    pub fn for_asset(asset: &Asset) -> Self {
        let number = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        Self {
            asset_id: asset.id.clone(),
            asset_type: asset.asset_type,
            name: asset.name.clone(),
            amount: asset.amount.to_string(),
            quantity: number(asset.quantity),
            price_per_unit: number(asset.price_per_unit),
            unit: asset.unit.clone().unwrap_or_default(),
            location: asset.location.clone().unwrap_or_default(),
            description: asset.description.clone().unwrap_or_default(),
        }
    }
}

impl Form for EditAssetForm {
    type Request = UpdateAssetRequest;

    fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some(EMPTY_NAME);
        }
        valuation_error(self.asset_type, &self.amount, &self.quantity, &self.price_per_unit)
    }

    fn build(&self) -> Option<UpdateAssetRequest> {
        let (amount, quantity, price) =
            valuation(self.asset_type, &self.amount, &self.quantity, &self.price_per_unit)?;
        let quantity_based = self.asset_type.is_quantity_based();
        Some(UpdateAssetRequest {
            amount: Some(amount),
            name: Some(self.name.trim().to_string()),
            quantity: quantity_based.then_some(quantity),
            unit: unit_for(self.asset_type, &self.unit),
            price_per_unit: quantity_based.then_some(price),
            acquisition_date: None,
            location: optional_text(&self.location),
            description: optional_text(&self.description),
        })
    }
}

/// Top-up or withdrawal against one asset
#[derive(Debug, Clone, PartialEq)]
pub struct AddAssetTransactionForm {
    pub asset_type: AssetType,
    /// Current value, the ceiling for a withdrawal
    pub available: f64,
    pub transaction_type: AssetTransactionType,
    pub amount: String,
    pub quantity: String,
    pub price_per_unit: String,
    pub note: String,
}

impl AddAssetTransactionForm {
    pub fn for_asset(asset: &Asset, transaction_type: AssetTransactionType) -> Self {
        Self {
            asset_type: asset.asset_type,
            available: asset.amount,
            transaction_type,
            amount: String::new(),
            quantity: String::new(),
            price_per_unit: asset
                .price_per_unit
                .map(|price| price.to_string())
                .unwrap_or_default(),
            note: String::new(),
        }
    }

    pub fn total(&self) -> f64 {
        valuation(self.asset_type, &self.amount, &self.quantity, &self.price_per_unit)
            .map(|(amount, _, _)| amount)
            .unwrap_or(0.0)
    }
}

impl Form for AddAssetTransactionForm {
    type Request = CreateAssetTransactionRequest;

    fn validation_error(&self) -> Option<&'static str> {
        if let Some(message) =
            valuation_error(self.asset_type, &self.amount, &self.quantity, &self.price_per_unit)
        {
            return Some(message);
        }
        if self.transaction_type == AssetTransactionType::Withdraw && self.total() > self.available {
            return Some("Insufficient asset balance");
        }
        None
    }

    fn build(&self) -> Option<CreateAssetTransactionRequest> {
        let request = if self.asset_type.is_quantity_based() {
            CreateAssetTransactionRequest {
                transaction_type: self.transaction_type,
                quantity: parse_positive(&self.quantity),
                price_per_unit: parse_positive(&self.price_per_unit),
                amount: None,
                datetime: None,
                note: optional_text(&self.note),
            }
        } else {
            CreateAssetTransactionRequest {
                transaction_type: self.transaction_type,
                quantity: None,
                price_per_unit: None,
                amount: parse_positive(&self.amount),
                datetime: None,
                note: optional_text(&self.note),
            }
        };
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gold() -> Asset {
        Asset {
            id: "a-gold".to_string(),
            name: "Antam".to_string(),
            asset_type: AssetType::GoldPhysical,
            amount: 10_000_000.0,
            currency: "IDR".to_string(),
            description: None,
            quantity: Some(10.0),
            unit: Some("gram".to_string()),
            price_per_unit: Some(1_000_000.0),
            acquisition_date: None,
            location: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_quantity_asset_total_and_unit() {
        let mut form = CreateAssetForm::new(AssetType::Stock);
        assert_eq!(form.unit, "lot");
        form.name = "BBCA".to_string();
        form.quantity = "2".to_string();
        form.price_per_unit = "950,000".to_string();
        form.unit = String::new();

        assert_eq!(form.total(), 1_900_000.0);
        let request = form.submit().unwrap();
        assert_eq!(request.amount, Some(1_900_000.0));
        assert_eq!(request.unit.as_deref(), Some("lot"));
    }

    #[test]
    fn test_amount_asset() {
        let mut form = CreateAssetForm::new(AssetType::SavingsAccount);
        form.name = "BCA".to_string();
        assert_eq!(form.validation_error(), Some(AMOUNT_NOT_POSITIVE));

        form.amount = "5000000".to_string();
        let request = form.submit().unwrap();
        assert_eq!(request.quantity, Some(1.0));
        assert_eq!(request.price_per_unit, Some(5_000_000.0));
        assert_eq!(request.unit, None);
    }

    #[test]
    fn test_set_asset_type_resets_unit() {
        let mut form = CreateAssetForm::new(AssetType::Stock);
        form.set_asset_type(AssetType::Cryptocurrency);
        assert_eq!(form.unit, "coin");
        form.set_asset_type(AssetType::Cash);
        assert_eq!(form.unit, "");
    }

    #[test]
    fn test_edit_recomputes_amount() {
        let mut form = EditAssetForm::for_asset(&gold());
        form.quantity = "12".to_string();
        let request = form.submit().unwrap();
        assert_eq!(request.amount, Some(12_000_000.0));
        assert_eq!(request.quantity, Some(12.0));

        form.name = " ".to_string();
        assert_eq!(form.validation_error(), Some(EMPTY_NAME));
    }

    #[test]
    fn test_withdraw_over_balance() {
        let mut form = AddAssetTransactionForm::for_asset(&gold(), AssetTransactionType::Withdraw);
        form.quantity = "11".to_string();
        assert_eq!(form.validation_error(), Some("Insufficient asset balance"));

        form.quantity = "3".to_string();
        let request = form.submit().unwrap();
        assert_eq!(request.total(), 3_000_000.0);
        assert_eq!(request.amount, None);
    }
}
