//! Database model for tax lots.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::tax_lots::{NewTaxLot, TaxLot};

use crate::utils::{date_to_text, decimal_to_text, text_to_date, text_to_decimal};

/// Database model for tax lots
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
#[diesel(table_name = crate::schema::tax_lots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaxLotDB {
    pub id: String,
    pub holding_id: String,
    pub source_transaction_id: String,
    pub original_quantity: String,
    pub remaining_quantity: String,
    pub cost_basis: String,
    pub cost_per_unit: String,
    pub acquired_at: String,
    pub created_at: NaiveDateTime,
}

impl From<TaxLotDB> for TaxLot {
    fn from(db: TaxLotDB) -> Self {
        Self {
            original_quantity: text_to_decimal(&db.original_quantity, "original_quantity"),
            remaining_quantity: text_to_decimal(&db.remaining_quantity, "remaining_quantity"),
            cost_basis: text_to_decimal(&db.cost_basis, "cost_basis"),
            cost_per_unit: text_to_decimal(&db.cost_per_unit, "cost_per_unit"),
            acquired_at: text_to_date(&db.acquired_at, "acquired_at"),
            id: db.id,
            holding_id: db.holding_id,
            source_transaction_id: db.source_transaction_id,
            created_at: db.created_at,
        }
    }
}

impl From<NewTaxLot> for TaxLotDB {
    fn from(domain: NewTaxLot) -> Self {
        let quantity = decimal_to_text(domain.quantity);
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            holding_id: domain.holding_id,
            source_transaction_id: domain.source_transaction_id,
            original_quantity: quantity.clone(),
            remaining_quantity: quantity,
            cost_basis: decimal_to_text(domain.cost_basis),
            cost_per_unit: decimal_to_text(domain.cost_per_unit),
            acquired_at: date_to_text(domain.acquired_at),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
