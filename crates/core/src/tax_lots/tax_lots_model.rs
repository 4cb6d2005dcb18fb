use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Units acquired by one BUY or reinvested dividend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLot {
    pub id: String,
    pub holding_id: String,
    pub source_transaction_id: String,
    pub original_quantity: Decimal,
    /// Always within `0..=original_quantity`.
    pub remaining_quantity: Decimal,
    pub cost_basis: Decimal,
    pub cost_per_unit: Decimal,
    pub acquired_at: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl TaxLot {
    pub fn is_open(&self) -> bool {
        self.remaining_quantity > Decimal::ZERO
    }

    /// `None` when the product leaves the decimal range.
    pub fn remaining_cost(&self) -> Option<Decimal> {
        self.remaining_quantity.checked_mul(self.cost_per_unit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxLot {
    pub holding_id: String,
    pub source_transaction_id: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub cost_per_unit: Decimal,
    pub acquired_at: NaiveDate,
}

/// Units taken from one lot by a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotConsumption {
    pub lot_id: String,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub days_held: i64,
    pub remaining_after: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillSummary {
    pub created: usize,
    pub consumed: usize,
    pub errors: Vec<String>,
}

/// Average-cost replay next to what the open lots say for one holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingLotComparison {
    pub holding_id: String,
    pub account_id: String,
    pub symbol: String,
    pub replay_quantity: Decimal,
    pub lot_quantity: Decimal,
    pub replay_cost_basis: Decimal,
    pub lot_cost_basis: Decimal,
    pub quantity_matches: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleShortfall {
    pub transaction_id: String,
    pub holding_id: Option<String>,
    pub symbol: Option<String>,
    pub date: NaiveDate,
    pub shortfall: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub portfolio_id: String,
    pub holdings: Vec<HoldingLotComparison>,
    pub shortfalls: Vec<SaleShortfall>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.shortfalls.is_empty() && self.holdings.iter().all(|h| h.quantity_matches)
    }
}
