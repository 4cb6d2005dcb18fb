//! Database model for accounts.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::accounts::{Account, NewAccount};

/// Database model for accounts
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
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub created_at: NaiveDateTime,
}

impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            name: db.name,
            account_type: db.account_type,
            currency: db.currency,
            created_at: db.created_at,
        }
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            portfolio_id: domain.portfolio_id,
            name: domain.name,
            account_type: domain.account_type,
            currency: domain.currency,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
