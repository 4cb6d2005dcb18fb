use std::sync::Arc;

use log::{debug, warn};
use rust_decimal::Decimal;

use super::asset_type::{infer_asset_type, is_forex_pair};
use super::holdings_model::{AssetType, Holding, HoldingPosition, NewHolding};
use super::holdings_traits::{HoldingRepositoryTrait, HoldingsServiceTrait};
use super::replay::{cash_balances, replay_position};
use crate::constants::{cash_symbol, CASH_SYMBOL_PREFIX};
use crate::errors::Result;
use crate::tax_lots::TaxLotRepositoryTrait;
use crate::transactions::TransactionRepositoryTrait;

pub struct HoldingsService {
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    tax_lot_repository: Arc<dyn TaxLotRepositoryTrait>,
}

impl HoldingsService {
    pub fn new(
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        tax_lot_repository: Arc<dyn TaxLotRepositoryTrait>,
    ) -> Self {
        Self {
            holding_repository,
            transaction_repository,
            tax_lot_repository,
        }
    }

    /// Unlinks transactions, drops lots, then the holding itself.
    async fn remove_holding(&self, holding: &Holding, reason: &str) -> Result<()> {
        let detached = self
            .transaction_repository
            .detach_holding(&holding.id)
            .await?;
        self.tax_lot_repository
            .delete_by_holdings(vec![holding.id.clone()])
            .await?;
        self.holding_repository.delete(&holding.id).await?;
        warn!(
            "Removed holding {} ({}) in account {}: {} ({} transactions detached)",
            holding.id, holding.symbol, holding.account_id, reason, detached
        );
        Ok(())
    }

    async fn upsert_cash(&self, account_id: &str, currency: &str, balance: Decimal) -> Result<Holding> {
        let holding = self
            .resolve_holding(account_id, &cash_symbol(currency))
            .await?;
        let position = HoldingPosition {
            quantity: balance,
            cost_basis: balance,
            avg_cost_per_unit: if balance.is_zero() {
                Decimal::ZERO
            } else {
                Decimal::ONE
            },
        };
        self.holding_repository
            .update_position(&holding.id, position)
            .await
    }
}

#[async_trait::async_trait]
impl HoldingsServiceTrait for HoldingsService {
    fn get_holding(&self, holding_id: &str) -> Result<Holding> {
        self.holding_repository.get_by_id(holding_id)
    }

    fn list_holdings(&self, account_id: &str) -> Result<Vec<Holding>> {
        self.holding_repository.list_by_account(account_id)
    }

    async fn resolve_holding(&self, account_id: &str, symbol: &str) -> Result<Holding> {
        let symbol = symbol.trim().to_uppercase();
        if let Some(existing) = self.holding_repository.find_by_symbol(account_id, &symbol)? {
            return Ok(existing);
        }

        let new_holding = NewHolding {
            account_id: account_id.to_string(),
            asset_type: infer_asset_type(&symbol),
            symbol: symbol.clone(),
        };
        match self.holding_repository.create(new_holding).await {
            Ok(created) => {
                debug!(
                    "Created {} holding {} in account {}",
                    created.asset_type, created.symbol, account_id
                );
                Ok(created)
            }
            // Lost a race with a concurrent import.
            Err(e) if e.is_unique_violation() => {
                match self.holding_repository.find_by_symbol(account_id, &symbol)? {
                    Some(existing) => Ok(existing),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn recompute_holding(&self, holding_id: &str) -> Result<HoldingPosition> {
        let holding = self.holding_repository.get_by_id(holding_id)?;
        let history = self.transaction_repository.list_by_holding(holding_id)?;
        let position = replay_position(&history)?;
        debug!(
            "Replayed {} transactions for {}: quantity {}, cost {}",
            history.len(),
            holding.symbol,
            position.quantity,
            position.cost_basis
        );
        self.holding_repository
            .update_position(holding_id, position)
            .await?;
        Ok(position)
    }

    async fn recompute_cash_balances(&self, account_id: &str) -> Result<Vec<Holding>> {
        let history = self.transaction_repository.list_by_account(account_id)?;
        let balances = cash_balances(&history)?;

        let mut updated = Vec::with_capacity(balances.len());
        for (currency, balance) in &balances {
            updated.push(self.upsert_cash(account_id, currency, *balance).await?);
        }

        // Currencies with no remaining cash flows.
        for holding in self.holding_repository.list_by_account(account_id)? {
            let stale = holding
                .symbol
                .strip_prefix(CASH_SYMBOL_PREFIX)
                .is_some_and(|currency| !balances.contains_key(currency));
            if holding.is_cash() && stale && !holding.quantity.is_zero() {
                updated.push(
                    self.holding_repository
                        .update_position(&holding.id, HoldingPosition::default())
                        .await?,
                );
            }
        }
        Ok(updated)
    }

    async fn recompute_account(&self, account_id: &str) -> Result<Vec<Holding>> {
        for holding in self.holding_repository.list_by_account(account_id)? {
            if !holding.is_cash() {
                self.recompute_holding(&holding.id).await?;
            }
        }
        self.recompute_cash_balances(account_id).await?;
        self.holding_repository.list_by_account(account_id)
    }

    async fn cleanup_spurious_holdings(&self, account_id: &str) -> Result<usize> {
        let mut removed = 0;
        for holding in self.holding_repository.list_by_account(account_id)? {
            if holding.is_cash() {
                continue;
            }
            let reason = if is_forex_pair(&holding.symbol) {
                "currency pair is not a position"
            } else if self
                .transaction_repository
                .list_by_holding(&holding.id)?
                .is_empty()
            {
                "no transactions reference it"
            } else {
                continue;
            };
            self.remove_holding(&holding, reason).await?;
            removed += 1;
        }
        Ok(removed)
    }

    async fn purge_sold_out_holdings(&self, account_id: &str) -> Result<usize> {
        let mut removed = 0;
        for holding in self.holding_repository.list_by_account(account_id)? {
            if holding.asset_type == AssetType::Cash {
                continue;
            }
            let history = self.transaction_repository.list_by_holding(&holding.id)?;
            if replay_position(&history)?.quantity.is_zero() {
                self.remove_holding(&holding, "position is fully sold").await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
