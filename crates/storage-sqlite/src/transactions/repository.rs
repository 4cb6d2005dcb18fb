use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;

use ledgerfolio_core::transactions::{
    NaturalKey, NewTransaction, SaleResult, Transaction, TransactionKind,
    TransactionRepositoryTrait,
};
use ledgerfolio_core::Result;

use super::model::TransactionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::schema::transactions::dsl::*;
use crate::utils::{date_to_text, decimal_to_text, opt_decimal_to_text};

/// Kinds the tax-lot engine reads back, stored as their canonical labels.
fn lot_event_kinds() -> [&'static str; 3] {
    [
        TransactionKind::Buy.as_str(),
        TransactionKind::ReinvestDividend.as_str(),
        TransactionKind::Sell.as_str(),
    ]
}

/// Repository for the transaction ledger
pub struct TransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    fn into_domain(rows: Vec<TransactionDB>) -> Vec<Transaction> {
        rows.into_iter().map(Transaction::from).collect()
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;

        let row = transactions
            .select(TransactionDB::as_select())
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(row.into())
    }

    fn list_by_account(&self, account: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions
            .filter(account_id.eq(account))
            .select(TransactionDB::as_select())
            .order((date.asc(), id.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(Self::into_domain(rows))
    }

    fn list_by_holding(&self, holding: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions
            .filter(holding_id.eq(holding))
            .select(TransactionDB::as_select())
            .order((date.asc(), id.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(Self::into_domain(rows))
    }

    fn list_lot_events(&self, account_ids: &[String]) -> Result<Vec<Transaction>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions
            .filter(account_id.eq_any(account_ids))
            .filter(holding_id.is_not_null())
            .filter(kind.eq_any(lot_event_kinds()))
            .select(TransactionDB::as_select())
            .order((date.asc(), id.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(Self::into_domain(rows))
    }

    fn fingerprints_for_account(&self, account: &str) -> Result<HashMap<String, String>> {
        let mut conn = get_connection(&self.pool)?;

        let pairs = transactions
            .filter(account_id.eq(account))
            .select((fingerprint, id))
            .load::<(String, String)>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(pairs.into_iter().collect())
    }

    fn find_by_natural_key(
        &self,
        account: &str,
        key: &NaturalKey,
        exclude_batch: Option<&str>,
    ) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = transactions
            .filter(account_id.eq(account))
            .filter(date.eq(date_to_text(key.date)))
            .filter(kind.eq(key.kind.as_str()))
            .filter(amount.eq(decimal_to_text(key.amount)))
            .select(id)
            .order(id.asc())
            .into_boxed();

        query = match key.symbol.as_deref() {
            Some(s) => query.filter(symbol.eq(s)),
            None => query.filter(symbol.is_null()),
        };
        query = match opt_decimal_to_text(key.quantity) {
            Some(q) => query.filter(quantity.eq(q)),
            None => query.filter(quantity.is_null()),
        };
        if let Some(batch) = exclude_batch {
            query = query.filter(import_batch.is_null().or(import_batch.ne(batch)));
        }

        let found = query
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(found)
    }

    fn list_by_import_batch(&self, batch: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions
            .filter(import_batch.eq(batch))
            .select(TransactionDB::as_select())
            .order((date.asc(), id.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(Self::into_domain(rows))
    }

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let row = TransactionDB::from_new(new_transaction).map_err(StorageError::from)?;

                diesel::insert_into(transactions::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(row.into())
            })
            .await
    }

    async fn update_sale_result(&self, transaction_id: &str, result: SaleResult) -> Result<()> {
        let target = transaction_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let updated = diesel::update(transactions.find(&target))
                    .set((
                        cost_basis_used.eq(Some(decimal_to_text(result.cost_basis_used))),
                        realized_gain_loss.eq(Some(decimal_to_text(result.realized_gain_loss))),
                        holding_period_days.eq(result.holding_period_days),
                        lot_shortfall.eq(Some(decimal_to_text(result.shortfall))),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                if updated == 0 {
                    return Err(StorageError::QueryFailed(diesel::result::Error::NotFound).into());
                }
                Ok(())
            })
            .await
    }

    async fn reset_sale_results(&self, account_ids: Vec<String>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let count = diesel::update(
                    transactions
                        .filter(account_id.eq_any(&account_ids))
                        .filter(kind.eq(TransactionKind::Sell.as_str())),
                )
                .set((
                    cost_basis_used.eq(None::<String>),
                    realized_gain_loss.eq(None::<String>),
                    holding_period_days.eq(None::<i64>),
                    lot_shortfall.eq(None::<String>),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;

                Ok(count)
            })
            .await
    }

    async fn delete_by_import_batch(&self, batch: &str) -> Result<usize> {
        let batch = batch.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let count = diesel::delete(transactions.filter(import_batch.eq(&batch)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(count)
            })
            .await
    }

    async fn detach_holding(&self, holding: &str) -> Result<usize> {
        let holding = holding.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let count = diesel::update(transactions.filter(holding_id.eq(&holding)))
                    .set(holding_id.eq(None::<String>))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(count)
            })
            .await
    }
}
