use async_trait::async_trait;
use rust_decimal::Decimal;

use super::tax_lots_model::{BackfillSummary, ConsistencyReport, NewTaxLot, TaxLot};
use crate::errors::Result;
use crate::transactions::{SaleResult, Transaction};

/// Persistence contract for tax lots.
///
/// List methods order lots by acquisition date, then creation order.
#[async_trait]
pub trait TaxLotRepositoryTrait: Send + Sync {
    fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<TaxLot>>;
    fn list_by_holding(&self, holding_id: &str) -> Result<Vec<TaxLot>>;
    fn list_open_by_holding(&self, holding_id: &str) -> Result<Vec<TaxLot>>;

    async fn create(&self, new_lot: NewTaxLot) -> Result<TaxLot>;
    async fn update_remaining(&self, lot_id: &str, remaining_quantity: Decimal) -> Result<()>;
    async fn delete_by_holdings(&self, holding_ids: Vec<String>) -> Result<usize>;
}

#[async_trait]
pub trait TaxLotServiceTrait: Send + Sync {
    fn list_lots(&self, holding_id: &str) -> Result<Vec<TaxLot>>;

    /// Opens the lot for an acquisition. Returns the existing lot when the
    /// transaction already has one.
    async fn create_lot(&self, transaction: &Transaction) -> Result<Option<TaxLot>>;

    /// Matches a SELL against open lots, FIFO, and stores the sale result on
    /// the transaction. A sale that already carries a result is returned as is.
    async fn consume_lots(&self, transaction: &Transaction) -> Result<Option<SaleResult>>;

    /// Creates missing lots and matches unmatched sales across the portfolio.
    async fn backfill_portfolio(&self, portfolio_id: &str) -> Result<BackfillSummary>;

    /// Drops every lot and sale result in the portfolio. Returns the number of
    /// lots deleted.
    async fn clear_portfolio(&self, portfolio_id: &str) -> Result<usize>;

    /// Clears the portfolio, then backfills.
    async fn rebuild_portfolio(&self, portfolio_id: &str) -> Result<BackfillSummary>;

    fn check_consistency(&self, portfolio_id: &str) -> Result<ConsistencyReport>;
}
