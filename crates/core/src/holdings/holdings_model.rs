use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Stock,
    Etf,
    MutualFund,
    Crypto,
    Cash,
    Other,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "STOCK",
            AssetType::Etf => "ETF",
            AssetType::MutualFund => "MUTUAL_FUND",
            AssetType::Crypto => "CRYPTO",
            AssetType::Cash => "CASH",
            AssetType::Other => "OTHER",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOCK" => Ok(AssetType::Stock),
            "ETF" => Ok(AssetType::Etf),
            "MUTUAL_FUND" => Ok(AssetType::MutualFund),
            "CRYPTO" => Ok(AssetType::Crypto),
            "CASH" => Ok(AssetType::Cash),
            "OTHER" => Ok(AssetType::Other),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown asset type '{}'",
                other
            )))),
        }
    }
}

/// Position in one symbol within one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub avg_cost_per_unit: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Holding {
    pub fn is_cash(&self) -> bool {
        self.asset_type == AssetType::Cash
    }

    pub fn position(&self) -> HoldingPosition {
        HoldingPosition {
            quantity: self.quantity,
            cost_basis: self.cost_basis,
            avg_cost_per_unit: self.avg_cost_per_unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHolding {
    pub account_id: String,
    pub symbol: String,
    pub asset_type: AssetType,
}

/// Result of replaying a holding's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingPosition {
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub avg_cost_per_unit: Decimal,
}
