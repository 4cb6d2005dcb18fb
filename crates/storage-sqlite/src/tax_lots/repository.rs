use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;

use ledgerfolio_core::tax_lots::{NewTaxLot, TaxLot, TaxLotRepositoryTrait};
use ledgerfolio_core::Result;

use super::model::TaxLotDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::tax_lots;
use crate::schema::tax_lots::dsl::*;
use crate::utils::decimal_to_text;

/// Repository for FIFO tax lots
pub struct TaxLotRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TaxLotRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TaxLotRepositoryTrait for TaxLotRepository {
    fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<TaxLot>> {
        let mut conn = get_connection(&self.pool)?;

        let row = tax_lots
            .filter(source_transaction_id.eq(transaction_id))
            .select(TaxLotDB::as_select())
            .first::<TaxLotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(row.map(TaxLot::from))
    }

    fn list_by_holding(&self, holding: &str) -> Result<Vec<TaxLot>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = tax_lots
            .filter(holding_id.eq(holding))
            .select(TaxLotDB::as_select())
            .order((acquired_at.asc(), created_at.asc(), id.asc()))
            .load::<TaxLotDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(TaxLot::from).collect())
    }

    fn list_open_by_holding(&self, holding: &str) -> Result<Vec<TaxLot>> {
        // Remaining quantities are decimal text, so openness is decided after parsing.
        Ok(self
            .list_by_holding(holding)?
            .into_iter()
            .filter(TaxLot::is_open)
            .collect())
    }

    async fn create(&self, new_lot: NewTaxLot) -> Result<TaxLot> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<TaxLot> {
                let row: TaxLotDB = new_lot.into();

                diesel::insert_into(tax_lots::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(row.into())
            })
            .await
    }

    async fn update_remaining(&self, lot_id: &str, remaining: Decimal) -> Result<()> {
        let target = lot_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let updated = diesel::update(tax_lots.find(&target))
                    .set(remaining_quantity.eq(decimal_to_text(remaining)))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                if updated == 0 {
                    return Err(StorageError::QueryFailed(diesel::result::Error::NotFound).into());
                }
                Ok(())
            })
            .await
    }

    async fn delete_by_holdings(&self, holding_ids: Vec<String>) -> Result<usize> {
        if holding_ids.is_empty() {
            return Ok(0);
        }
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let count = diesel::delete(tax_lots.filter(holding_id.eq_any(&holding_ids)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(count)
            })
            .await
    }
}
