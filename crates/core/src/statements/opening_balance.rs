//! Opening-balance synthesis for bank exports that carry a running balance.
//!
//! The balance shown on the most recent row is the closing balance. Whatever
//! the parsed rows do not explain was already in the account before the first
//! of them, so it is emitted as an ADJUSTMENT dated the day before.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::statement_model::{ParseWarning, StatementFormat};
use crate::constants::{OPENING_BALANCE_DESCRIPTION, THREE_DECIMAL_CURRENCIES};
use crate::transactions::{CanonicalTransaction, FingerprintBuilder, TransactionKind};

/// Smallest opening balance worth a row in this currency.
pub fn opening_balance_epsilon(currency: &str) -> Decimal {
    if THREE_DECIMAL_CURRENCIES.contains(&currency.to_uppercase().as_str()) {
        Decimal::new(1, 3)
    } else {
        Decimal::new(1, 2)
    }
}

#[derive(Debug, Clone, Copy)]
struct Observed {
    date: NaiveDate,
    rank: i64,
    balance: Decimal,
}

/// Tracks the latest running balance seen per currency.
///
/// `rank` orders rows within the same day: parsers of newest-first exports
/// pass a descending rank, oldest-first ones an ascending rank.
#[derive(Debug, Default)]
pub struct ClosingBalances {
    latest: HashMap<String, Observed>,
}

impl ClosingBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, currency: &str, date: NaiveDate, rank: i64, balance: Decimal) {
        let candidate = Observed {
            date,
            rank,
            balance,
        };
        self.latest
            .entry(currency.to_string())
            .and_modify(|current| {
                if (date, rank) >= (current.date, current.rank) {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    pub fn closing(&self, currency: &str) -> Option<Decimal> {
        self.latest.get(currency).map(|o| o.balance)
    }

    /// One ADJUSTMENT per currency whose opening balance exceeds epsilon.
    ///
    /// A currency whose flows leave the decimal range gets a statement-level
    /// warning (row 0) instead of an adjustment.
    pub fn opening_adjustments(
        &self,
        format: StatementFormat,
        transactions: &[CanonicalTransaction],
        warnings: &mut Vec<ParseWarning>,
    ) -> Vec<CanonicalTransaction> {
        let mut totals: BTreeMap<&str, (Option<Decimal>, NaiveDate)> = BTreeMap::new();
        for tx in transactions {
            let entry = totals
                .entry(tx.currency.as_str())
                .or_insert((Some(Decimal::ZERO), tx.date));
            entry.0 = entry.0.and_then(|sum| sum.checked_add(tx.amount));
            entry.1 = entry.1.min(tx.date);
        }

        let mut adjustments = Vec::new();
        for (currency, (sum, earliest)) in totals {
            let Some(closing) = self.closing(currency) else {
                continue;
            };
            let Some(opening) = sum.and_then(|sum| closing.checked_sub(sum)) else {
                warn!("{} opening balance overflowed, omitted", currency);
                warnings.push(ParseWarning {
                    row: 0,
                    message: format!("{} opening balance out of range, omitted", currency),
                });
                continue;
            };
            if opening.abs() <= opening_balance_epsilon(currency) {
                debug!("{} opening balance {} within epsilon, omitted", currency, opening);
                continue;
            }
            let date = earliest.pred_opt().unwrap_or(earliest);
            let fingerprint = FingerprintBuilder::new(format.as_str())
                .text("opening-balance")
                .text(currency)
                .text(&date.to_string())
                .decimal(Some(opening))
                .finish();
            adjustments.push(CanonicalTransaction {
                date,
                kind: TransactionKind::Adjustment,
                symbol: None,
                description: OPENING_BALANCE_DESCRIPTION.to_string(),
                quantity: None,
                price: None,
                amount: opening,
                fees: None,
                currency: currency.to_string(),
                fingerprint,
                source_format: format,
                category: None,
                merchant: None,
                is_recurring: false,
                raw_fields: BTreeMap::new(),
            });
        }
        adjustments
    }
}
