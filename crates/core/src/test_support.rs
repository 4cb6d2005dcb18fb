//! In-memory repositories shared by the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::accounts::{Account, AccountRepositoryTrait, AccountService, NewAccount};
use crate::errors::{DatabaseError, Error, Result};
use crate::holdings::{
    Holding, HoldingPosition, HoldingRepositoryTrait, HoldingsService, HoldingsServiceTrait,
    NewHolding,
};
use crate::imports::ImportService;
use crate::tax_lots::{NewTaxLot, TaxLot, TaxLotRepositoryTrait, TaxLotService, TaxLotServiceTrait};
use crate::transactions::{
    NaturalKey, NewTransaction, SaleResult, Transaction, TransactionKind,
    TransactionRepositoryTrait,
};

fn not_found(what: &str, id: &str) -> Error {
    Error::Database(DatabaseError::NotFound(format!("{} {}", what, id)))
}

#[derive(Default)]
pub struct InMemoryLedger {
    next_id: AtomicUsize,
    pub accounts: Mutex<Vec<Account>>,
    pub transactions: Mutex<Vec<Transaction>>,
    pub holdings: Mutex<Vec<Holding>>,
    pub lots: Mutex<Vec<TaxLot>>,
}

impl InMemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn add_account(&self, id: &str, portfolio_id: &str, currency: &str) -> Account {
        let account = Account {
            id: id.to_string(),
            portfolio_id: portfolio_id.to_string(),
            name: format!("Account {}", id),
            account_type: "BROKERAGE".to_string(),
            currency: currency.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        self.accounts.lock().unwrap().push(account.clone());
        account
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }

    pub fn holding_by_symbol(&self, account_id: &str, symbol: &str) -> Option<Holding> {
        self.holdings
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.account_id == account_id && h.symbol == symbol)
            .cloned()
    }

    /// Replay order: date, then insertion.
    fn sorted(&self, filter: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| filter(t))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.date);
        rows
    }
}

/// A fully wired service graph over one in-memory ledger.
pub struct Services {
    pub ledger: Arc<InMemoryLedger>,
    pub accounts: Arc<AccountService>,
    pub holdings: Arc<HoldingsService>,
    pub tax_lots: Arc<TaxLotService>,
    pub imports: ImportService,
}

pub fn services() -> Services {
    let ledger = InMemoryLedger::new();
    let holdings = Arc::new(HoldingsService::new(
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
    ));
    let tax_lots = Arc::new(TaxLotService::new(
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
    ));
    let imports = ImportService::new(
        ledger.clone(),
        ledger.clone(),
        holdings.clone() as Arc<dyn HoldingsServiceTrait>,
        tax_lots.clone() as Arc<dyn TaxLotServiceTrait>,
    );
    Services {
        accounts: Arc::new(AccountService::new(ledger.clone())),
        ledger,
        holdings,
        tax_lots,
        imports,
    }
}

/// Minimal transaction for seeding the ledger directly.
pub fn new_transaction(
    account_id: &str,
    holding_id: Option<&str>,
    kind: TransactionKind,
    date: NaiveDate,
    quantity: Option<Decimal>,
    price: Option<Decimal>,
    amount: Decimal,
) -> NewTransaction {
    NewTransaction {
        id: None,
        account_id: account_id.to_string(),
        holding_id: holding_id.map(str::to_string),
        kind,
        symbol: None,
        description: kind.to_string(),
        date,
        quantity,
        price,
        amount,
        fees: None,
        currency: "USD".to_string(),
        fingerprint: format!("{}-{}-{}-{:?}", date, kind, amount, quantity),
        import_batch: None,
        import_source: None,
        category: None,
        merchant: None,
        is_recurring: false,
        raw_fields: None,
    }
}

#[async_trait]
impl AccountRepositoryTrait for InMemoryLedger {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        let account = Account {
            id: new_account.id.unwrap_or_else(|| self.id("acc")),
            portfolio_id: new_account.portfolio_id,
            name: new_account.name,
            account_type: new_account.account_type,
            currency: new_account.currency,
            created_at: Utc::now().naive_utc(),
        };
        self.accounts.lock().unwrap().push(account.clone());
        Ok(account)
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == account_id)
            .cloned()
            .ok_or_else(|| not_found("account", account_id))
    }

    fn list(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryLedger {
    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| not_found("transaction", transaction_id))
    }

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Transaction>> {
        Ok(self.sorted(|t| t.account_id == account_id))
    }

    fn list_by_holding(&self, holding_id: &str) -> Result<Vec<Transaction>> {
        Ok(self.sorted(|t| t.holding_id.as_deref() == Some(holding_id)))
    }

    fn list_lot_events(&self, account_ids: &[String]) -> Result<Vec<Transaction>> {
        Ok(self.sorted(|t| {
            account_ids.contains(&t.account_id)
                && t.holding_id.is_some()
                && (t.kind.opens_lot() || t.kind == TransactionKind::Sell)
        }))
    }

    fn fingerprints_for_account(&self, account_id: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account_id == account_id)
            .map(|t| (t.fingerprint.clone(), t.id.clone()))
            .collect())
    }

    fn find_by_natural_key(
        &self,
        account_id: &str,
        key: &NaturalKey,
        exclude_batch: Option<&str>,
    ) -> Result<Option<String>> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| {
                t.account_id == account_id
                    && (exclude_batch.is_none() || t.import_batch.as_deref() != exclude_batch)
                    && t.date == key.date
                    && t.kind == key.kind
                    && t.symbol == key.symbol
                    && t.amount == key.amount
                    && t.quantity == key.quantity
            })
            .map(|t| t.id.clone()))
    }

    fn list_by_import_batch(&self, import_batch: &str) -> Result<Vec<Transaction>> {
        Ok(self.sorted(|t| t.import_batch.as_deref() == Some(import_batch)))
    }

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let mut rows = self.transactions.lock().unwrap();
        if rows.iter().any(|t| {
            t.account_id == new_transaction.account_id
                && t.fingerprint == new_transaction.fingerprint
        }) {
            return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                "transactions.fingerprint {}",
                new_transaction.fingerprint
            ))));
        }
        let tx = Transaction {
            id: new_transaction.id.unwrap_or_else(|| self.id("tx")),
            account_id: new_transaction.account_id,
            holding_id: new_transaction.holding_id,
            kind: new_transaction.kind,
            symbol: new_transaction.symbol,
            description: new_transaction.description,
            date: new_transaction.date,
            quantity: new_transaction.quantity,
            price: new_transaction.price,
            amount: new_transaction.amount,
            fees: new_transaction.fees,
            currency: new_transaction.currency,
            fingerprint: new_transaction.fingerprint,
            import_batch: new_transaction.import_batch,
            import_source: new_transaction.import_source,
            category: new_transaction.category,
            merchant: new_transaction.merchant,
            is_recurring: new_transaction.is_recurring,
            raw_fields: new_transaction.raw_fields,
            cost_basis_used: None,
            realized_gain_loss: None,
            holding_period_days: None,
            lot_shortfall: None,
            created_at: Utc::now().naive_utc(),
        };
        rows.push(tx.clone());
        Ok(tx)
    }

    async fn update_sale_result(&self, transaction_id: &str, result: SaleResult) -> Result<()> {
        let mut rows = self.transactions.lock().unwrap();
        let tx = rows
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| not_found("transaction", transaction_id))?;
        tx.cost_basis_used = Some(result.cost_basis_used);
        tx.realized_gain_loss = Some(result.realized_gain_loss);
        tx.holding_period_days = result.holding_period_days;
        tx.lot_shortfall = Some(result.shortfall);
        Ok(())
    }

    async fn reset_sale_results(&self, account_ids: Vec<String>) -> Result<usize> {
        let mut count = 0;
        for tx in self.transactions.lock().unwrap().iter_mut() {
            if account_ids.contains(&tx.account_id) && tx.kind == TransactionKind::Sell {
                tx.cost_basis_used = None;
                tx.realized_gain_loss = None;
                tx.holding_period_days = None;
                tx.lot_shortfall = None;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_by_import_batch(&self, import_batch: &str) -> Result<usize> {
        let mut rows = self.transactions.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| t.import_batch.as_deref() != Some(import_batch));
        Ok(before - rows.len())
    }

    async fn detach_holding(&self, holding_id: &str) -> Result<usize> {
        let mut count = 0;
        for tx in self.transactions.lock().unwrap().iter_mut() {
            if tx.holding_id.as_deref() == Some(holding_id) {
                tx.holding_id = None;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl HoldingRepositoryTrait for InMemoryLedger {
    fn get_by_id(&self, holding_id: &str) -> Result<Holding> {
        self.holdings
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.id == holding_id)
            .cloned()
            .ok_or_else(|| not_found("holding", holding_id))
    }

    fn find_by_symbol(&self, account_id: &str, symbol: &str) -> Result<Option<Holding>> {
        Ok(self.holding_by_symbol(account_id, symbol))
    }

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Holding>> {
        Ok(self
            .holdings
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.account_id == account_id)
            .cloned()
            .collect())
    }

    fn list_by_accounts(&self, account_ids: &[String]) -> Result<Vec<Holding>> {
        Ok(self
            .holdings
            .lock()
            .unwrap()
            .iter()
            .filter(|h| account_ids.contains(&h.account_id))
            .cloned()
            .collect())
    }

    async fn create(&self, new_holding: NewHolding) -> Result<Holding> {
        let mut rows = self.holdings.lock().unwrap();
        if rows
            .iter()
            .any(|h| h.account_id == new_holding.account_id && h.symbol == new_holding.symbol)
        {
            return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                "holdings {}/{}",
                new_holding.account_id, new_holding.symbol
            ))));
        }
        let now = Utc::now().naive_utc();
        let holding = Holding {
            id: self.id("holding"),
            account_id: new_holding.account_id,
            symbol: new_holding.symbol,
            asset_type: new_holding.asset_type,
            quantity: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            avg_cost_per_unit: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        rows.push(holding.clone());
        Ok(holding)
    }

    async fn update_position(&self, holding_id: &str, position: HoldingPosition) -> Result<Holding> {
        let mut rows = self.holdings.lock().unwrap();
        let holding = rows
            .iter_mut()
            .find(|h| h.id == holding_id)
            .ok_or_else(|| not_found("holding", holding_id))?;
        holding.quantity = position.quantity;
        holding.cost_basis = position.cost_basis;
        holding.avg_cost_per_unit = position.avg_cost_per_unit;
        holding.updated_at = Utc::now().naive_utc();
        Ok(holding.clone())
    }

    async fn delete(&self, holding_id: &str) -> Result<()> {
        self.holdings.lock().unwrap().retain(|h| h.id != holding_id);
        Ok(())
    }
}

#[async_trait]
impl TaxLotRepositoryTrait for InMemoryLedger {
    fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<TaxLot>> {
        Ok(self
            .lots
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.source_transaction_id == transaction_id)
            .cloned())
    }

    fn list_by_holding(&self, holding_id: &str) -> Result<Vec<TaxLot>> {
        let mut lots: Vec<TaxLot> = self
            .lots
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.holding_id == holding_id)
            .cloned()
            .collect();
        lots.sort_by_key(|l| l.acquired_at);
        Ok(lots)
    }

    fn list_open_by_holding(&self, holding_id: &str) -> Result<Vec<TaxLot>> {
        let mut lots = TaxLotRepositoryTrait::list_by_holding(self, holding_id)?;
        lots.retain(TaxLot::is_open);
        Ok(lots)
    }

    async fn create(&self, new_lot: NewTaxLot) -> Result<TaxLot> {
        let lot = TaxLot {
            id: self.id("lot"),
            holding_id: new_lot.holding_id,
            source_transaction_id: new_lot.source_transaction_id,
            original_quantity: new_lot.quantity,
            remaining_quantity: new_lot.quantity,
            cost_basis: new_lot.cost_basis,
            cost_per_unit: new_lot.cost_per_unit,
            acquired_at: new_lot.acquired_at,
            created_at: Utc::now().naive_utc(),
        };
        self.lots.lock().unwrap().push(lot.clone());
        Ok(lot)
    }

    async fn update_remaining(&self, lot_id: &str, remaining_quantity: Decimal) -> Result<()> {
        let mut lots = self.lots.lock().unwrap();
        let lot = lots
            .iter_mut()
            .find(|l| l.id == lot_id)
            .ok_or_else(|| not_found("tax lot", lot_id))?;
        lot.remaining_quantity = remaining_quantity;
        Ok(())
    }

    async fn delete_by_holdings(&self, holding_ids: Vec<String>) -> Result<usize> {
        let mut lots = self.lots.lock().unwrap();
        let before = lots.len();
        lots.retain(|l| !holding_ids.contains(&l.holding_id));
        Ok(before - lots.len())
    }
}
