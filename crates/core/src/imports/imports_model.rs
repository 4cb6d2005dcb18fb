use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::statements::StatementFormat;
use crate::transactions::TransactionKind;

fn default_skip_duplicates() -> bool {
    true
}

/// Per-call import options. `format` and `currency` fall back to detection
/// and the account currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    pub account_id: String,
    #[serde(default)]
    pub format: Option<StatementFormat>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_skip_duplicates")]
    pub skip_duplicates: bool,
    #[serde(default)]
    pub currency: Option<String>,
}

impl ImportOptions {
    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            format: None,
            dry_run: false,
            skip_duplicates: true,
            currency: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Imported,
    WouldImport,
    Skipped,
    Error,
}

/// Outcome of one parsed row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowResult {
    pub row: usize,
    pub status: RowStatus,
    pub transaction_id: Option<String>,
    /// Id of the persisted row a duplicate matched.
    pub existing_id: Option<String>,
    pub reason: Option<String>,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub symbol: Option<String>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub batch_id: String,
    pub format: StatementFormat,
    pub dry_run: bool,
    pub total: usize,
    pub imported: usize,
    pub would_import: usize,
    pub skipped: usize,
    pub errors: usize,
    pub results: Vec<RowResult>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackSummary {
    pub batch_id: String,
    pub deleted: usize,
    pub accounts_recomputed: Vec<String>,
    pub warnings: Vec<String>,
}
