use std::collections::HashMap;

use crate::errors::Result;
use crate::transactions::{CanonicalTransaction, TransactionRepositoryTrait};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    New,
    Duplicate { existing_id: String, reason: String },
}

/// Classifies parsed rows of one import batch against an account's ledger.
///
/// Fingerprints are fetched once up front. The natural-key fallback queries
/// the repository per row and ignores rows of the batch being imported, so
/// identical rows inside one file never shadow each other.
pub struct DuplicateDetector<'a> {
    repository: &'a dyn TransactionRepositoryTrait,
    account_id: String,
    batch_id: String,
    fingerprints: HashMap<String, String>,
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(
        repository: &'a dyn TransactionRepositoryTrait,
        account_id: &str,
        batch_id: &str,
    ) -> Result<Self> {
        let fingerprints = repository.fingerprints_for_account(account_id)?;
        Ok(Self {
            repository,
            account_id: account_id.to_string(),
            batch_id: batch_id.to_string(),
            fingerprints,
        })
    }

    pub fn classify(&self, tx: &CanonicalTransaction) -> Result<DedupOutcome> {
        if let Some(existing_id) = self.fingerprints.get(&tx.fingerprint) {
            return Ok(DedupOutcome::Duplicate {
                existing_id: existing_id.clone(),
                reason: format!("Fingerprint matches transaction {}", existing_id),
            });
        }

        let key = tx.natural_key();
        match self
            .repository
            .find_by_natural_key(&self.account_id, &key, Some(&self.batch_id))?
        {
            Some(existing_id) => Ok(DedupOutcome::Duplicate {
                reason: format!(
                    "Same date, type, symbol, amount and quantity as transaction {}",
                    existing_id
                ),
                existing_id,
            }),
            None => Ok(DedupOutcome::New),
        }
    }

    /// Makes a freshly persisted row visible to later fingerprint lookups.
    pub fn record(&mut self, fingerprint: &str, transaction_id: &str) {
        self.fingerprints
            .insert(fingerprint.to_string(), transaction_id.to_string());
    }
}
