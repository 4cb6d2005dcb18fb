use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, error, info, warn};
use uuid::Uuid;

use super::dedup::{DedupOutcome, DuplicateDetector};
use super::imports_model::{ImportOptions, ImportSummary, RollbackSummary, RowResult, RowStatus};
use super::imports_traits::ImportServiceTrait;
use crate::accounts::{Account, AccountRepositoryTrait};
use crate::errors::Result;
use crate::holdings::HoldingsServiceTrait;
use crate::statements::{decode_statement, ImportTemplate, StatementDispatcher, StatementFormat};
use crate::tax_lots::TaxLotServiceTrait;
use crate::transactions::{
    CanonicalTransaction, NewTransaction, Transaction, TransactionKind, TransactionRepositoryTrait,
};

pub struct ImportService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    holdings_service: Arc<dyn HoldingsServiceTrait>,
    tax_lot_service: Arc<dyn TaxLotServiceTrait>,
    dispatcher: StatementDispatcher,
}

impl ImportService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        holdings_service: Arc<dyn HoldingsServiceTrait>,
        tax_lot_service: Arc<dyn TaxLotServiceTrait>,
    ) -> Self {
        Self {
            account_repository,
            transaction_repository,
            holdings_service,
            tax_lot_service,
            dispatcher: StatementDispatcher::default(),
        }
    }

    /// Links the row to its holding, creating the holding on first reference,
    /// then persists it under the batch.
    async fn persist_row(
        &self,
        account_id: &str,
        batch_id: &str,
        tx: &CanonicalTransaction,
    ) -> Result<Transaction> {
        let holding_id = match tx.symbol.as_deref() {
            Some(symbol) if !symbol.trim().is_empty() => Some(
                self.holdings_service
                    .resolve_holding(account_id, symbol)
                    .await?
                    .id,
            ),
            _ => None,
        };
        let new_transaction = NewTransaction::from_canonical(tx, account_id, holding_id, batch_id);
        self.transaction_repository.create(new_transaction).await
    }

    /// Spurious-holding cleanup and a full replay of one account. Failures
    /// come back as warnings.
    async fn refresh_account(&self, account: &Account) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Err(e) = self
            .holdings_service
            .cleanup_spurious_holdings(&account.id)
            .await
        {
            error!("Holding cleanup failed for account {}: {}", account.id, e);
            warnings.push(format!("Holding cleanup failed: {}", e));
        }
        if let Err(e) = self.holdings_service.recompute_account(&account.id).await {
            error!("Holdings replay failed for account {}: {}", account.id, e);
            warnings.push(format!("Holdings replay failed: {}", e));
        }
        warnings
    }

    /// True when a sale already matched against lots is dated on or after an
    /// acquisition that just arrived for the same holding. Incremental
    /// backfill would leave that sale matched against newer lots.
    fn backdates_matched_sale(
        &self,
        portfolio_id: &str,
        acquisitions: &HashMap<String, NaiveDate>,
    ) -> Result<bool> {
        if acquisitions.is_empty() {
            return Ok(false);
        }
        let account_ids: Vec<String> = self
            .account_repository
            .list_by_portfolio(portfolio_id)?
            .into_iter()
            .map(|a| a.id)
            .collect();
        let events = self.transaction_repository.list_lot_events(&account_ids)?;
        Ok(events.iter().any(|tx| {
            tx.kind == TransactionKind::Sell
                && tx.sale_result().is_some()
                && tx
                    .holding_id
                    .as_ref()
                    .and_then(|h| acquisitions.get(h))
                    .is_some_and(|earliest| tx.date >= *earliest)
        }))
    }

    /// Backfills the portfolio's lots, rebuilding them instead when the new
    /// acquisitions predate sales that were already matched.
    async fn derive_lots(
        &self,
        portfolio_id: &str,
        acquisitions: &HashMap<String, NaiveDate>,
    ) -> Vec<String> {
        match self.backdates_matched_sale(portfolio_id, acquisitions) {
            Ok(true) => {
                info!(
                    "Backdated acquisitions in portfolio {}, rebuilding tax lots",
                    portfolio_id
                );
                self.rebuild(portfolio_id).await
            }
            Ok(false) => self.backfill(portfolio_id).await,
            Err(e) => {
                error!("Tax lot check failed for portfolio {}: {}", portfolio_id, e);
                vec![format!("Tax lot check failed: {}", e)]
            }
        }
    }

    async fn rebuild(&self, portfolio_id: &str) -> Vec<String> {
        match self.tax_lot_service.rebuild_portfolio(portfolio_id).await {
            Ok(summary) => summary
                .errors
                .into_iter()
                .map(|e| format!("Tax lot rebuild: {}", e))
                .collect(),
            Err(e) => {
                error!("Tax lot rebuild failed for portfolio {}: {}", portfolio_id, e);
                vec![format!("Tax lot rebuild failed: {}", e)]
            }
        }
    }

    async fn backfill(&self, portfolio_id: &str) -> Vec<String> {
        match self.tax_lot_service.backfill_portfolio(portfolio_id).await {
            Ok(summary) => summary
                .errors
                .into_iter()
                .map(|e| format!("Tax lot backfill: {}", e))
                .collect(),
            Err(e) => {
                error!("Tax lot backfill failed for portfolio {}: {}", portfolio_id, e);
                vec![format!("Tax lot backfill failed: {}", e)]
            }
        }
    }
}

fn row_result(row: usize, status: RowStatus, tx: &CanonicalTransaction) -> RowResult {
    RowResult {
        row,
        status,
        transaction_id: None,
        existing_id: None,
        reason: None,
        date: tx.date,
        kind: tx.kind,
        symbol: tx.symbol.clone(),
        amount: tx.amount,
    }
}

#[async_trait::async_trait]
impl ImportServiceTrait for ImportService {
    fn detect_format(&self, text: &str) -> Option<StatementFormat> {
        self.dispatcher.detect_format(text)
    }

    fn templates(&self) -> Vec<ImportTemplate> {
        self.dispatcher.templates()
    }

    async fn import_statement(&self, text: &str, options: ImportOptions) -> Result<ImportSummary> {
        let account = self.account_repository.get_by_id(&options.account_id)?;
        let currency = options
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(account.currency.as_str())
            .to_uppercase();

        let parsed = self.dispatcher.parse(text, options.format, &currency)?;
        let batch_id = Uuid::new_v4().to_string();
        let mut detector =
            DuplicateDetector::new(self.transaction_repository.as_ref(), &account.id, &batch_id)?;

        let mut summary = ImportSummary {
            batch_id: batch_id.clone(),
            format: parsed.format,
            dry_run: options.dry_run,
            total: parsed.transactions.len(),
            imported: 0,
            would_import: 0,
            skipped: 0,
            errors: 0,
            results: Vec::with_capacity(parsed.transactions.len()),
            warnings: parsed
                .warnings
                .iter()
                .map(|w| format!("Row {}: {}", w.row, w.message))
                .collect(),
        };

        // Earliest new acquisition per holding.
        let mut acquisitions: HashMap<String, NaiveDate> = HashMap::new();
        for (index, tx) in parsed.transactions.iter().enumerate() {
            let row = index + 1;
            let outcome = match detector.classify(tx) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Duplicate check failed for row {}: {}", row, e);
                    let mut result = row_result(row, RowStatus::Error, tx);
                    result.reason = Some(e.to_string());
                    summary.errors += 1;
                    summary.results.push(result);
                    continue;
                }
            };

            let mut result = row_result(row, RowStatus::Imported, tx);
            if let DedupOutcome::Duplicate {
                existing_id,
                reason,
            } = outcome
            {
                if options.skip_duplicates {
                    debug!("Skipping row {}: {}", row, reason);
                    result.status = RowStatus::Skipped;
                    result.existing_id = Some(existing_id);
                    result.reason = Some(reason);
                    summary.skipped += 1;
                    summary.results.push(result);
                    continue;
                }
                result.existing_id = Some(existing_id);
                result.reason = Some(reason);
            }

            if options.dry_run {
                result.status = RowStatus::WouldImport;
                summary.would_import += 1;
                summary.results.push(result);
                continue;
            }

            match self.persist_row(&account.id, &batch_id, tx).await {
                Ok(created) => {
                    detector.record(&tx.fingerprint, &created.id);
                    if created.kind.opens_lot() {
                        if let Some(holding_id) = &created.holding_id {
                            acquisitions
                                .entry(holding_id.clone())
                                .and_modify(|d| *d = (*d).min(created.date))
                                .or_insert(created.date);
                        }
                    }
                    result.transaction_id = Some(created.id);
                    summary.imported += 1;
                }
                Err(e) => {
                    error!("Failed to import row {}: {}", row, e);
                    result.status = RowStatus::Error;
                    result.reason = Some(e.to_string());
                    summary.errors += 1;
                }
            }
            summary.results.push(result);
        }

        if !options.dry_run && summary.imported > 0 {
            let mut warnings = self.refresh_account(&account).await;
            warnings.extend(self.derive_lots(&account.portfolio_id, &acquisitions).await);
            for w in &warnings {
                warn!("Import batch {}: {}", batch_id, w);
            }
            summary.warnings.extend(warnings);
        }

        info!(
            "Import batch {} ({}) into account {}: {} rows, {} imported, {} would import, {} skipped, {} errors",
            batch_id,
            summary.format,
            account.id,
            summary.total,
            summary.imported,
            summary.would_import,
            summary.skipped,
            summary.errors
        );
        Ok(summary)
    }

    async fn import_bytes(&self, bytes: &[u8], options: ImportOptions) -> Result<ImportSummary> {
        let text = decode_statement(bytes);
        self.import_statement(&text, options).await
    }

    fn batch_accounts(&self, batch_id: &str) -> Result<Vec<Account>> {
        let account_ids: BTreeSet<String> = self
            .transaction_repository
            .list_by_import_batch(batch_id)?
            .into_iter()
            .map(|t| t.account_id)
            .collect();
        account_ids
            .iter()
            .map(|id| self.account_repository.get_by_id(id))
            .collect()
    }

    async fn rollback(&self, batch_id: &str) -> Result<RollbackSummary> {
        let accounts = self.batch_accounts(batch_id)?;
        if accounts.is_empty() {
            // Fully skipped batches persist nothing, and neither do unknown ids.
            info!("Import batch {} has no transactions, nothing to roll back", batch_id);
            return Ok(RollbackSummary {
                batch_id: batch_id.to_string(),
                deleted: 0,
                accounts_recomputed: Vec::new(),
                warnings: Vec::new(),
            });
        }

        let portfolio_ids: BTreeSet<String> =
            accounts.iter().map(|a| a.portfolio_id.clone()).collect();

        // Lots reference the rows being deleted.
        for portfolio_id in &portfolio_ids {
            self.tax_lot_service.clear_portfolio(portfolio_id).await?;
        }
        let deleted = self
            .transaction_repository
            .delete_by_import_batch(batch_id)
            .await?;

        let mut warnings = Vec::new();
        for account in &accounts {
            warnings.extend(self.refresh_account(account).await);
        }
        for portfolio_id in &portfolio_ids {
            warnings.extend(self.backfill(portfolio_id).await);
        }

        info!(
            "Rolled back import batch {}: {} transactions deleted across {} accounts",
            batch_id,
            deleted,
            accounts.len()
        );
        Ok(RollbackSummary {
            batch_id: batch_id.to_string(),
            deleted,
            accounts_recomputed: accounts.into_iter().map(|a| a.id).collect(),
            warnings,
        })
    }
}
