//! Transaction domain models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};
use crate::statements::StatementFormat;

/// Kind of ledger event. Cash direction always comes from the signed
/// `amount`, never from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Dividend,
    ReinvestDividend,
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
    Interest,
    Fee,
    TaxWithholding,
    Adjustment,
    Split,
    Other,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 14] = [
        TransactionKind::Buy,
        TransactionKind::Sell,
        TransactionKind::Dividend,
        TransactionKind::ReinvestDividend,
        TransactionKind::Deposit,
        TransactionKind::Withdrawal,
        TransactionKind::TransferIn,
        TransactionKind::TransferOut,
        TransactionKind::Interest,
        TransactionKind::Fee,
        TransactionKind::TaxWithholding,
        TransactionKind::Adjustment,
        TransactionKind::Split,
        TransactionKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "BUY",
            TransactionKind::Sell => "SELL",
            TransactionKind::Dividend => "DIVIDEND",
            TransactionKind::ReinvestDividend => "REINVEST_DIVIDEND",
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::TransferIn => "TRANSFER_IN",
            TransactionKind::TransferOut => "TRANSFER_OUT",
            TransactionKind::Interest => "INTEREST",
            TransactionKind::Fee => "FEE",
            TransactionKind::TaxWithholding => "TAX_WITHHOLDING",
            TransactionKind::Adjustment => "ADJUSTMENT",
            TransactionKind::Split => "SPLIT",
            TransactionKind::Other => "OTHER",
        }
    }

    /// Kinds that add units to a holding during replay.
    pub fn adds_units(&self) -> bool {
        matches!(
            self,
            TransactionKind::Buy | TransactionKind::TransferIn | TransactionKind::ReinvestDividend
        )
    }

    /// Kinds that remove units from a holding during replay.
    pub fn removes_units(&self) -> bool {
        matches!(self, TransactionKind::Sell | TransactionKind::TransferOut)
    }

    /// Kinds that open a FIFO tax lot.
    pub fn opens_lot(&self) -> bool {
        matches!(self, TransactionKind::Buy | TransactionKind::ReinvestDividend)
    }

    /// Reinvested dividends are in-kind and never touch cash.
    pub fn moves_cash(&self) -> bool {
        !matches!(self, TransactionKind::ReinvestDividend)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        TransactionKind::ALL
            .iter()
            .find(|kind| kind.as_str() == normalized)
            .copied()
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Unknown transaction kind '{}'",
                    s
                )))
            })
    }
}

/// Normalized record produced by every statement parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTransaction {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub symbol: Option<String>,
    pub description: String,
    /// Non-negative magnitude for trades; split factor for SPLIT.
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    /// Signed cash effect; positive means cash in.
    pub amount: Decimal,
    pub fees: Option<Decimal>,
    pub currency: String,
    pub fingerprint: String,
    pub source_format: StatementFormat,
    pub category: Option<String>,
    pub merchant: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    /// Original row keyed by header, kept for audit only.
    #[serde(default)]
    pub raw_fields: BTreeMap<String, String>,
}

impl CanonicalTransaction {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            date: self.date,
            kind: self.kind,
            symbol: self.symbol.clone(),
            amount: self.amount,
            quantity: self.quantity,
        }
    }
}

/// Content fields two imports of the same event agree on even when their
/// fingerprint schemes differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub symbol: Option<String>,
    pub amount: Decimal,
    pub quantity: Option<Decimal>,
}

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub holding_id: Option<String>,
    pub kind: TransactionKind,
    pub symbol: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub fees: Option<Decimal>,
    pub currency: String,
    pub fingerprint: String,
    pub import_batch: Option<String>,
    pub import_source: Option<String>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub is_recurring: bool,
    pub raw_fields: Option<BTreeMap<String, String>>,
    pub cost_basis_used: Option<Decimal>,
    pub realized_gain_loss: Option<Decimal>,
    pub holding_period_days: Option<i64>,
    pub lot_shortfall: Option<Decimal>,
    pub created_at: NaiveDateTime,
}

impl Transaction {
    /// Quantity as a magnitude, zero when absent.
    pub fn units(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ZERO).abs()
    }

    pub fn fees_or_zero(&self) -> Decimal {
        self.fees.unwrap_or(Decimal::ZERO)
    }

    /// Stored sale result, present once the tax-lot engine has matched this sale.
    pub fn sale_result(&self) -> Option<SaleResult> {
        let cost_basis_used = self.cost_basis_used?;
        let realized_gain_loss = self.realized_gain_loss?;
        let shortfall = self.lot_shortfall.unwrap_or(Decimal::ZERO);
        Some(SaleResult {
            cost_basis_used,
            realized_gain_loss,
            holding_period_days: self.holding_period_days,
            quantity_matched: (self.units() - shortfall).max(Decimal::ZERO),
            shortfall,
        })
    }
}

/// Input model for persisting a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Option<String>,
    pub account_id: String,
    pub holding_id: Option<String>,
    pub kind: TransactionKind,
    pub symbol: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub fees: Option<Decimal>,
    pub currency: String,
    pub fingerprint: String,
    pub import_batch: Option<String>,
    pub import_source: Option<String>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub is_recurring: bool,
    pub raw_fields: Option<BTreeMap<String, String>>,
}

impl NewTransaction {
    /// Builds the persistence input for a parsed row of an import batch.
    pub fn from_canonical(
        tx: &CanonicalTransaction,
        account_id: &str,
        holding_id: Option<String>,
        import_batch: &str,
    ) -> Self {
        Self {
            id: None,
            account_id: account_id.to_string(),
            holding_id,
            kind: tx.kind,
            symbol: tx.symbol.clone(),
            description: tx.description.clone(),
            date: tx.date,
            quantity: tx.quantity,
            price: tx.price,
            amount: tx.amount,
            fees: tx.fees,
            currency: tx.currency.clone(),
            fingerprint: tx.fingerprint.clone(),
            import_batch: Some(import_batch.to_string()),
            import_source: Some(tx.source_format.as_str().to_string()),
            category: tx.category.clone(),
            merchant: tx.merchant.clone(),
            is_recurring: tx.is_recurring,
            raw_fields: if tx.raw_fields.is_empty() {
                None
            } else {
                Some(tx.raw_fields.clone())
            },
        }
    }
}

/// Outcome of matching one SELL against open lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResult {
    pub cost_basis_used: Decimal,
    pub realized_gain_loss: Decimal,
    pub holding_period_days: Option<i64>,
    pub quantity_matched: Decimal,
    /// Units the sale could not match to any open lot.
    pub shortfall: Decimal,
}

impl SaleResult {
    pub fn has_shortfall(&self) -> bool {
        self.shortfall > Decimal::ZERO
    }
}
