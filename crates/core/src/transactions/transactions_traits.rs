use std::collections::HashMap;

use async_trait::async_trait;

use super::transactions_model::{NaturalKey, NewTransaction, SaleResult, Transaction};
use crate::errors::Result;

/// Persistence contract for the transaction ledger.
///
/// Every list method returns rows in replay order: date ascending, then
/// insertion order.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction>;
    fn list_by_account(&self, account_id: &str) -> Result<Vec<Transaction>>;
    fn list_by_holding(&self, holding_id: &str) -> Result<Vec<Transaction>>;

    /// BUY, REINVEST_DIVIDEND and SELL rows linked to a holding, across accounts.
    fn list_lot_events(&self, account_ids: &[String]) -> Result<Vec<Transaction>>;

    /// Fingerprint to transaction id for every row of the account.
    fn fingerprints_for_account(&self, account_id: &str) -> Result<HashMap<String, String>>;

    /// Id of a persisted row matching the natural key, ignoring rows tagged
    /// with `exclude_batch`.
    fn find_by_natural_key(
        &self,
        account_id: &str,
        key: &NaturalKey,
        exclude_batch: Option<&str>,
    ) -> Result<Option<String>>;

    fn list_by_import_batch(&self, import_batch: &str) -> Result<Vec<Transaction>>;

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction>;
    async fn update_sale_result(&self, transaction_id: &str, result: SaleResult) -> Result<()>;

    /// Clears sale-result columns of every SELL in the accounts.
    async fn reset_sale_results(&self, account_ids: Vec<String>) -> Result<usize>;
    async fn delete_by_import_batch(&self, import_batch: &str) -> Result<usize>;

    /// Unlinks every transaction from the holding.
    async fn detach_holding(&self, holding_id: &str) -> Result<usize>;
}
