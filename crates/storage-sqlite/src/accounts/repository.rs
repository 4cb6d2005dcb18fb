use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerfolio_core::accounts::{Account, AccountRepositoryTrait, NewAccount};
use ledgerfolio_core::Result;

use super::model::AccountDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::accounts;
use crate::schema::accounts::dsl::*;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Account> {
                let mut account_db: AccountDB = new_account.into();
                if account_db.id.is_empty() {
                    account_db.id = uuid::Uuid::new_v4().to_string();
                }

                diesel::insert_into(accounts::table)
                    .values(&account_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(account_db.into())
            })
            .await
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;

        let account = accounts
            .select(AccountDB::as_select())
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(account.into())
    }

    fn list(&self) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let results = accounts
            .select(AccountDB::as_select())
            .order((portfolio_id.asc(), name.asc()))
            .load::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(Account::from).collect())
    }

    fn list_by_portfolio(&self, portfolio: &str) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let results = accounts
            .filter(portfolio_id.eq(portfolio))
            .select(AccountDB::as_select())
            .order(name.asc())
            .load::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(Account::from).collect())
    }
}
