//! Database model for transactions.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::error;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::transactions::{NewTransaction, Transaction, TransactionKind};

use crate::utils::{
    date_to_text, decimal_to_text, opt_decimal_to_text, opt_text_to_decimal, text_to_date,
    text_to_decimal,
};

/// Database model for ledger rows
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub account_id: String,
    pub holding_id: Option<String>,
    pub kind: String,
    pub symbol: Option<String>,
    pub description: String,
    pub date: String,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub amount: String,
    pub fees: Option<String>,
    pub currency: String,
    pub fingerprint: String,
    pub import_batch: Option<String>,
    pub import_source: Option<String>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub is_recurring: bool,
    pub raw_fields: Option<String>,
    pub cost_basis_used: Option<String>,
    pub realized_gain_loss: Option<String>,
    pub holding_period_days: Option<i64>,
    pub lot_shortfall: Option<String>,
    pub created_at: NaiveDateTime,
}

fn parse_kind(value: &str, id: &str) -> TransactionKind {
    value.parse().unwrap_or_else(|e| {
        error!("Transaction {} has an unreadable kind: {}", id, e);
        TransactionKind::Other
    })
}

fn parse_raw_fields(value: Option<&str>, id: &str) -> Option<BTreeMap<String, String>> {
    let raw = value?;
    match serde_json::from_str(raw) {
        Ok(fields) => Some(fields),
        Err(e) => {
            error!("Transaction {} has unreadable raw fields: {}", id, e);
            None
        }
    }
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            kind: parse_kind(&db.kind, &db.id),
            raw_fields: parse_raw_fields(db.raw_fields.as_deref(), &db.id),
            date: text_to_date(&db.date, "date"),
            quantity: opt_text_to_decimal(db.quantity.as_deref(), "quantity"),
            price: opt_text_to_decimal(db.price.as_deref(), "price"),
            amount: text_to_decimal(&db.amount, "amount"),
            fees: opt_text_to_decimal(db.fees.as_deref(), "fees"),
            cost_basis_used: opt_text_to_decimal(db.cost_basis_used.as_deref(), "cost_basis_used"),
            realized_gain_loss: opt_text_to_decimal(
                db.realized_gain_loss.as_deref(),
                "realized_gain_loss",
            ),
            lot_shortfall: opt_text_to_decimal(db.lot_shortfall.as_deref(), "lot_shortfall"),
            id: db.id,
            account_id: db.account_id,
            holding_id: db.holding_id,
            symbol: db.symbol,
            description: db.description,
            currency: db.currency,
            fingerprint: db.fingerprint,
            import_batch: db.import_batch,
            import_source: db.import_source,
            category: db.category,
            merchant: db.merchant,
            is_recurring: db.is_recurring,
            holding_period_days: db.holding_period_days,
            created_at: db.created_at,
        }
    }
}

impl TransactionDB {
    /// Builds the row for a new transaction. Ids are time-ordered so that
    /// sorting by id reproduces insertion order within a day.
    pub fn from_new(domain: NewTransaction) -> Result<Self, serde_json::Error> {
        let raw_fields = domain
            .raw_fields
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            id: domain
                .id
                .unwrap_or_else(|| uuid::Uuid::now_v7().to_string()),
            account_id: domain.account_id,
            holding_id: domain.holding_id,
            kind: domain.kind.as_str().to_string(),
            symbol: domain.symbol,
            description: domain.description,
            date: date_to_text(domain.date),
            quantity: opt_decimal_to_text(domain.quantity),
            price: opt_decimal_to_text(domain.price),
            amount: decimal_to_text(domain.amount),
            fees: opt_decimal_to_text(domain.fees),
            currency: domain.currency,
            fingerprint: domain.fingerprint,
            import_batch: domain.import_batch,
            import_source: domain.import_source,
            category: domain.category,
            merchant: domain.merchant,
            is_recurring: domain.is_recurring,
            raw_fields,
            cost_basis_used: None,
            realized_gain_loss: None,
            holding_period_days: None,
            lot_shortfall: None,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }
}
