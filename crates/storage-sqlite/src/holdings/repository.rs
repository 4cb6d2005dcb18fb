use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;

use ledgerfolio_core::holdings::{Holding, HoldingPosition, HoldingRepositoryTrait, NewHolding};
use ledgerfolio_core::Result;

use super::model::HoldingDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::holdings;
use crate::schema::holdings::dsl::*;
use crate::utils::decimal_to_text;

/// Repository for holdings
pub struct HoldingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl HoldingRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl HoldingRepositoryTrait for HoldingRepository {
    fn get_by_id(&self, holding_id: &str) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)?;

        let row = holdings
            .select(HoldingDB::as_select())
            .find(holding_id)
            .first::<HoldingDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(row.into())
    }

    fn find_by_symbol(&self, account: &str, ticker: &str) -> Result<Option<Holding>> {
        let mut conn = get_connection(&self.pool)?;

        let row = holdings
            .filter(account_id.eq(account))
            .filter(symbol.eq(ticker))
            .select(HoldingDB::as_select())
            .first::<HoldingDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(row.map(Holding::from))
    }

    fn list_by_account(&self, account: &str) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = holdings
            .filter(account_id.eq(account))
            .select(HoldingDB::as_select())
            .order(symbol.asc())
            .load::<HoldingDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(Holding::from).collect())
    }

    fn list_by_accounts(&self, account_ids: &[String]) -> Result<Vec<Holding>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let rows = holdings
            .filter(account_id.eq_any(account_ids))
            .select(HoldingDB::as_select())
            .order((account_id.asc(), symbol.asc()))
            .load::<HoldingDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(Holding::from).collect())
    }

    async fn create(&self, new_holding: NewHolding) -> Result<Holding> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Holding> {
                let row: HoldingDB = new_holding.into();

                diesel::insert_into(holdings::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(row.into())
            })
            .await
    }

    async fn update_position(
        &self,
        holding_id: &str,
        position: HoldingPosition,
    ) -> Result<Holding> {
        let target = holding_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Holding> {
                let row = diesel::update(holdings.find(&target))
                    .set((
                        quantity.eq(decimal_to_text(position.quantity)),
                        cost_basis.eq(decimal_to_text(position.cost_basis)),
                        avg_cost_per_unit.eq(decimal_to_text(position.avg_cost_per_unit)),
                        updated_at.eq(chrono::Utc::now().naive_utc()),
                    ))
                    .returning(HoldingDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(row.into())
            })
            .await
    }

    async fn delete(&self, holding_id: &str) -> Result<()> {
        let target = holding_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::delete(holdings.find(&target))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
