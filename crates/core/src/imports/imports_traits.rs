use async_trait::async_trait;

use super::imports_model::{ImportOptions, ImportSummary, RollbackSummary};
use crate::accounts::Account;
use crate::errors::Result;
use crate::statements::{ImportTemplate, StatementFormat};

#[async_trait]
pub trait ImportServiceTrait: Send + Sync {
    fn detect_format(&self, text: &str) -> Option<StatementFormat>;
    fn templates(&self) -> Vec<ImportTemplate>;

    async fn import_statement(&self, text: &str, options: ImportOptions) -> Result<ImportSummary>;

    /// Decodes raw export bytes (BOM, legacy encodings) before importing.
    async fn import_bytes(&self, bytes: &[u8], options: ImportOptions) -> Result<ImportSummary>;

    /// Accounts holding rows of the batch. Empty for unknown or fully
    /// skipped batches.
    fn batch_accounts(&self, batch_id: &str) -> Result<Vec<Account>>;

    /// Deletes every transaction of the batch and rebuilds derived state of
    /// the affected portfolios.
    async fn rollback(&self, batch_id: &str) -> Result<RollbackSummary>;
}
