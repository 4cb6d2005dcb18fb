use async_trait::async_trait;

use super::holdings_model::{Holding, HoldingPosition, NewHolding};
use crate::errors::Result;

/// Persistence contract for holdings.
#[async_trait]
pub trait HoldingRepositoryTrait: Send + Sync {
    fn get_by_id(&self, holding_id: &str) -> Result<Holding>;
    fn find_by_symbol(&self, account_id: &str, symbol: &str) -> Result<Option<Holding>>;
    fn list_by_account(&self, account_id: &str) -> Result<Vec<Holding>>;
    fn list_by_accounts(&self, account_ids: &[String]) -> Result<Vec<Holding>>;

    /// Fails with a unique violation when the (account, symbol) pair exists.
    async fn create(&self, new_holding: NewHolding) -> Result<Holding>;
    async fn update_position(&self, holding_id: &str, position: HoldingPosition)
        -> Result<Holding>;
    async fn delete(&self, holding_id: &str) -> Result<()>;
}

/// Replay and maintenance operations over holdings.
#[async_trait]
pub trait HoldingsServiceTrait: Send + Sync {
    fn get_holding(&self, holding_id: &str) -> Result<Holding>;
    fn list_holdings(&self, account_id: &str) -> Result<Vec<Holding>>;

    /// Existing holding for the symbol, created on first reference.
    async fn resolve_holding(&self, account_id: &str, symbol: &str) -> Result<Holding>;

    async fn recompute_holding(&self, holding_id: &str) -> Result<HoldingPosition>;
    async fn recompute_cash_balances(&self, account_id: &str) -> Result<Vec<Holding>>;

    /// Replays every holding of the account, then its cash balances.
    async fn recompute_account(&self, account_id: &str) -> Result<Vec<Holding>>;

    /// Deletes forex-pair pseudo holdings and holdings nothing references.
    async fn cleanup_spurious_holdings(&self, account_id: &str) -> Result<usize>;

    /// Deletes non-cash holdings whose replayed quantity is zero.
    async fn purge_sold_out_holdings(&self, account_id: &str) -> Result<usize>;
}
