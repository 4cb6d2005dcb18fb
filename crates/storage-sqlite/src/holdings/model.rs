//! Database model for holdings.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::holdings::{AssetType, Holding, NewHolding};

use crate::utils::{decimal_to_text, text_to_decimal};

/// Database model for holdings
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
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub asset_type: String,
    pub quantity: String,
    pub cost_basis: String,
    pub avg_cost_per_unit: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<HoldingDB> for Holding {
    fn from(db: HoldingDB) -> Self {
        let asset_type = db.asset_type.parse().unwrap_or_else(|e| {
            error!("Holding {} has an unreadable asset type: {}", db.id, e);
            AssetType::Other
        });
        Self {
            asset_type,
            quantity: text_to_decimal(&db.quantity, "quantity"),
            cost_basis: text_to_decimal(&db.cost_basis, "cost_basis"),
            avg_cost_per_unit: text_to_decimal(&db.avg_cost_per_unit, "avg_cost_per_unit"),
            id: db.id,
            account_id: db.account_id,
            symbol: db.symbol,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewHolding> for HoldingDB {
    fn from(domain: NewHolding) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let zero = decimal_to_text(Decimal::ZERO);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: domain.account_id,
            symbol: domain.symbol,
            asset_type: domain.asset_type.as_str().to_string(),
            quantity: zero.clone(),
            cost_basis: zero.clone(),
            avg_cost_per_unit: zero,
            created_at: now,
            updated_at: now,
        }
    }
}
