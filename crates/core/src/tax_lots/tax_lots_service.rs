use std::sync::Arc;

use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::fifo::{lot_from_acquisition, match_lots_fifo};
use super::tax_lots_model::{
    BackfillSummary, ConsistencyReport, HoldingLotComparison, SaleShortfall, TaxLot,
};
use super::tax_lots_traits::{TaxLotRepositoryTrait, TaxLotServiceTrait};
use crate::accounts::AccountRepositoryTrait;
use crate::constants::{DECIMAL_PRECISION, QUANTITY_THRESHOLD};
use crate::errors::{CalculatorError, Result};
use crate::holdings::{replay_position, HoldingRepositoryTrait};
use crate::transactions::{SaleResult, Transaction, TransactionKind, TransactionRepositoryTrait};

pub struct TaxLotService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    tax_lot_repository: Arc<dyn TaxLotRepositoryTrait>,
}

impl TaxLotService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        tax_lot_repository: Arc<dyn TaxLotRepositoryTrait>,
    ) -> Self {
        Self {
            account_repository,
            transaction_repository,
            holding_repository,
            tax_lot_repository,
        }
    }

    fn portfolio_account_ids(&self, portfolio_id: &str) -> Result<Vec<String>> {
        Ok(self
            .account_repository
            .list_by_portfolio(portfolio_id)?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }
}

fn quantity_threshold() -> Decimal {
    QUANTITY_THRESHOLD.parse().unwrap_or(Decimal::ZERO)
}

/// Sale proceeds net of fees. Falls back to the cash amount when the row has
/// no price.
fn sale_proceeds(tx: &Transaction) -> Option<Decimal> {
    match tx.price {
        Some(price) => tx
            .units()
            .checked_mul(price)?
            .checked_sub(tx.fees_or_zero().abs()),
        None => Some(tx.amount),
    }
}

#[async_trait::async_trait]
impl TaxLotServiceTrait for TaxLotService {
    fn list_lots(&self, holding_id: &str) -> Result<Vec<TaxLot>> {
        self.tax_lot_repository.list_by_holding(holding_id)
    }

    async fn create_lot(&self, transaction: &Transaction) -> Result<Option<TaxLot>> {
        let Some(new_lot) = lot_from_acquisition(transaction)? else {
            return Ok(None);
        };
        if let Some(existing) = self
            .tax_lot_repository
            .find_by_transaction(&transaction.id)?
        {
            return Ok(Some(existing));
        }

        debug!(
            "Opening lot of {} units for transaction {}",
            new_lot.quantity, transaction.id
        );
        self.tax_lot_repository.create(new_lot).await.map(Some)
    }

    async fn consume_lots(&self, transaction: &Transaction) -> Result<Option<SaleResult>> {
        if transaction.kind != TransactionKind::Sell {
            return Ok(None);
        }
        let Some(holding_id) = transaction.holding_id.as_deref() else {
            return Ok(None);
        };
        let quantity = transaction.units();
        if quantity <= Decimal::ZERO {
            return Ok(None);
        }
        if let Some(existing) = transaction.sale_result() {
            return Ok(Some(existing));
        }

        let open_lots = self.tax_lot_repository.list_open_by_holding(holding_id)?;
        let matched = match_lots_fifo(&open_lots, quantity, transaction.date)?;
        let realized_gain_loss = sale_proceeds(transaction)
            .and_then(|proceeds| proceeds.checked_sub(matched.cost_basis_used))
            .ok_or_else(|| CalculatorError::Overflow(format!("realized gain of sale {}", transaction.id)))?
            .round_dp(DECIMAL_PRECISION);

        for consumption in &matched.consumptions {
            self.tax_lot_repository
                .update_remaining(&consumption.lot_id, consumption.remaining_after)
                .await?;
        }

        if matched.shortfall > Decimal::ZERO {
            warn!(
                "Sale {} of {} units left {} units unmatched by open lots",
                transaction.id, quantity, matched.shortfall
            );
        }

        let result = SaleResult {
            cost_basis_used: matched.cost_basis_used,
            realized_gain_loss,
            holding_period_days: matched.holding_period_days,
            quantity_matched: matched.matched,
            shortfall: matched.shortfall,
        };
        self.transaction_repository
            .update_sale_result(&transaction.id, result.clone())
            .await?;
        Ok(Some(result))
    }

    async fn backfill_portfolio(&self, portfolio_id: &str) -> Result<BackfillSummary> {
        let account_ids = self.portfolio_account_ids(portfolio_id)?;
        let mut events = self.transaction_repository.list_lot_events(&account_ids)?;
        // Same-day acquisitions are available to same-day sales.
        events.sort_by_key(|tx| (tx.date, !tx.kind.opens_lot()));

        let mut summary = BackfillSummary::default();
        for tx in &events {
            if tx.kind.opens_lot() {
                if self.tax_lot_repository.find_by_transaction(&tx.id)?.is_some() {
                    continue;
                }
                match self.create_lot(tx).await {
                    Ok(Some(_)) => summary.created += 1,
                    Ok(None) => {}
                    Err(e) => summary.errors.push(format!("{}: {}", tx.id, e)),
                }
            } else if tx.kind == TransactionKind::Sell && tx.sale_result().is_none() {
                match self.consume_lots(tx).await {
                    Ok(Some(_)) => summary.consumed += 1,
                    Ok(None) => {}
                    Err(e) => summary.errors.push(format!("{}: {}", tx.id, e)),
                }
            }
        }

        info!(
            "Tax lot backfill for portfolio {}: {} lots created, {} sales matched, {} errors",
            portfolio_id,
            summary.created,
            summary.consumed,
            summary.errors.len()
        );
        Ok(summary)
    }

    async fn clear_portfolio(&self, portfolio_id: &str) -> Result<usize> {
        let account_ids = self.portfolio_account_ids(portfolio_id)?;
        let holding_ids: Vec<String> = self
            .holding_repository
            .list_by_accounts(&account_ids)?
            .into_iter()
            .map(|h| h.id)
            .collect();

        let deleted = self
            .tax_lot_repository
            .delete_by_holdings(holding_ids)
            .await?;
        let reset = self
            .transaction_repository
            .reset_sale_results(account_ids)
            .await?;
        debug!(
            "Cleared tax lots for portfolio {}: dropped {} lots, reset {} sales",
            portfolio_id, deleted, reset
        );
        Ok(deleted)
    }

    async fn rebuild_portfolio(&self, portfolio_id: &str) -> Result<BackfillSummary> {
        self.clear_portfolio(portfolio_id).await?;
        self.backfill_portfolio(portfolio_id).await
    }

    fn check_consistency(&self, portfolio_id: &str) -> Result<ConsistencyReport> {
        let account_ids = self.portfolio_account_ids(portfolio_id)?;
        let threshold = quantity_threshold();

        let mut holdings = Vec::new();
        for holding in self.holding_repository.list_by_accounts(&account_ids)? {
            if holding.is_cash() {
                continue;
            }
            let history = self.transaction_repository.list_by_holding(&holding.id)?;
            let replayed = replay_position(&history)?;
            let lots = self.tax_lot_repository.list_by_holding(&holding.id)?;
            let lot_overflow = || CalculatorError::Overflow(format!("open lots of holding {}", holding.id));
            let lot_quantity = lots
                .iter()
                .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.remaining_quantity))
                .ok_or_else(lot_overflow)?;
            let lot_cost_basis = lots
                .iter()
                .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.remaining_cost()?))
                .ok_or_else(lot_overflow)?;

            holdings.push(HoldingLotComparison {
                holding_id: holding.id,
                account_id: holding.account_id,
                symbol: holding.symbol,
                replay_quantity: replayed.quantity,
                lot_quantity,
                replay_cost_basis: replayed.cost_basis,
                lot_cost_basis: lot_cost_basis.round_dp(DECIMAL_PRECISION),
                quantity_matches: (replayed.quantity - lot_quantity).abs() <= threshold,
            });
        }

        let shortfalls = self
            .transaction_repository
            .list_lot_events(&account_ids)?
            .into_iter()
            .filter_map(|tx| {
                let shortfall = tx.lot_shortfall.filter(|s| *s > Decimal::ZERO)?;
                Some(SaleShortfall {
                    transaction_id: tx.id,
                    holding_id: tx.holding_id,
                    symbol: tx.symbol,
                    date: tx.date,
                    shortfall,
                })
            })
            .collect();

        Ok(ConsistencyReport {
            portfolio_id: portfolio_id.to_string(),
            holdings,
            shortfalls,
        })
    }
}
