//! Fidelity brokerage "Accounts History" export.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use rust_decimal::Decimal;

use super::kind_mapping::{by_sign, infer_kind};
use super::parser_traits::StatementParser;
use super::statement_model::{ParsedStatement, StatementFormat};
use super::table::read_table;
use super::values::{is_empty_row, parse_us_date, RowNumbers};
use crate::errors::Result;
use crate::transactions::{
    normalize_description, CanonicalTransaction, FingerprintBuilder, TransactionKind,
};

const HEADERS: [&str; 6] = [
    "Run Date",
    "Action",
    "Symbol",
    "Quantity",
    "Price ($)",
    "Amount ($)",
];

/// Action prefixes in lookup order. `None` means "decide by sign".
const ACTION_PREFIXES: &[(&str, Option<TransactionKind>)] = &[
    ("YOU BOUGHT", Some(TransactionKind::Buy)),
    ("YOU SOLD", Some(TransactionKind::Sell)),
    ("REINVESTMENT", Some(TransactionKind::ReinvestDividend)),
    ("DIVIDEND RECEIVED", Some(TransactionKind::Dividend)),
    ("INTEREST EARNED", Some(TransactionKind::Interest)),
    ("FOREIGN TAX PAID", Some(TransactionKind::TaxWithholding)),
    ("FEE CHARGED", Some(TransactionKind::Fee)),
    ("ELECTRONIC FUNDS TRANSFER RECEIVED", Some(TransactionKind::Deposit)),
    ("ELECTRONIC FUNDS TRANSFER PAID", Some(TransactionKind::Withdrawal)),
    ("DIRECT DEPOSIT", Some(TransactionKind::Deposit)),
    ("DIRECT DEBIT", Some(TransactionKind::Withdrawal)),
    ("CHECK RECEIVED", Some(TransactionKind::Deposit)),
    ("CASH CONTRIBUTION", Some(TransactionKind::Deposit)),
    ("TRANSFERRED FROM", Some(TransactionKind::TransferIn)),
    ("TRANSFERRED TO", Some(TransactionKind::TransferOut)),
    ("JOURNALED", None),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct FidelityParser;

fn ticker_in_action() -> &'static Regex {
    static TICKER: OnceLock<Regex> = OnceLock::new();
    TICKER.get_or_init(|| Regex::new(r"\(([A-Z][A-Z0-9.]{0,9})\)").expect("valid ticker regex"))
}

fn map_action(action: &str, direction: Decimal) -> TransactionKind {
    let upper = action.trim().to_uppercase();
    for (prefix, kind) in ACTION_PREFIXES {
        if upper.starts_with(prefix) {
            return kind.unwrap_or_else(|| {
                by_sign(direction, TransactionKind::TransferIn, TransactionKind::TransferOut)
            });
        }
    }
    infer_kind(action, direction)
}

fn clean_symbol(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_end_matches('*').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_uppercase())
}

/// A dividend whose proceeds were immediately reinvested never reached cash.
/// Re-tags it so the pair nets to zero in the cash balance.
fn pair_reinvested_dividends(transactions: &mut [CanonicalTransaction]) {
    let reinvestments: Vec<_> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::ReinvestDividend)
        .map(|t| (t.date, t.symbol.clone(), t.amount))
        .collect();

    for tx in transactions
        .iter_mut()
        .filter(|t| t.kind == TransactionKind::Dividend)
    {
        let paired = reinvestments
            .iter()
            .any(|(date, symbol, amount)| *date == tx.date && *symbol == tx.symbol && *amount == -tx.amount);
        if paired {
            debug!("fidelity: dividend on {} for {:?} was reinvested", tx.date, tx.symbol);
            tx.kind = TransactionKind::ReinvestDividend;
        }
    }
}

impl StatementParser for FidelityParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Fidelity
    }

    fn header_signature(&self) -> &'static [&'static str] {
        &HEADERS
    }

    fn date_format(&self) -> &'static str {
        "%m/%d/%Y"
    }

    fn parse(&self, text: &str, currency: &str) -> Result<ParsedStatement> {
        let table = read_table(text)?;
        let date_col = table.column("Run Date");
        let action_col = table.column("Action");
        let symbol_col = table.column("Symbol");
        let description_col = table.column("Description");
        let quantity_col = table.column("Quantity");
        let price_col = table.column("Price ($)");
        let commission_col = table.column("Commission ($)");
        let fees_col = table.column("Fees ($)");
        let amount_col = table.column("Amount ($)");
        let settlement_col = table.column("Settlement Date");

        let mut warnings = table.warnings.clone();
        let mut transactions = Vec::new();

        for row in &table.rows {
            let Some(date) = parse_us_date(row.get(date_col)) else {
                debug!("fidelity: skipping non-transaction row {}", row.index);
                continue;
            };
            let action = normalize_description(row.get(action_col));
            let symbol = clean_symbol(row.get(symbol_col)).or_else(|| {
                ticker_in_action()
                    .captures(&action)
                    .map(|c| c[1].to_string())
            });
            let description = match row.non_empty(description_col) {
                Some(d) if !d.eq_ignore_ascii_case("no description") => normalize_description(d),
                _ => action.clone(),
            };

            let mut numbers = RowNumbers::new(row.index, &mut warnings);
            let signed_quantity = numbers.parse("Quantity", row.get(quantity_col));
            let price = numbers.parse("Price ($)", row.get(price_col));
            let commission = numbers.parse("Commission ($)", row.get(commission_col));
            let fee = numbers.parse("Fees ($)", row.get(fees_col));
            let parsed_amount = numbers.parse("Amount ($)", row.get(amount_col));

            let amount = parsed_amount.unwrap_or(Decimal::ZERO);
            let quantity = signed_quantity.map(|q| q.abs());
            let fees = match (commission, fee) {
                (None, None) => None,
                (c, f) => numbers.checked(
                    "Fees ($)",
                    c.unwrap_or_default()
                        .abs()
                        .checked_add(f.unwrap_or_default().abs()),
                ),
            };
            let malformed = numbers.malformed();

            if !malformed && is_empty_row(amount, quantity) {
                debug!("fidelity: skipping empty row {}", row.index);
                continue;
            }

            let direction = if amount.is_zero() {
                signed_quantity.unwrap_or(Decimal::ZERO)
            } else {
                amount
            };
            let kind = map_action(&action, direction);

            let fingerprint = FingerprintBuilder::new(self.format().as_str())
                .text(&date.to_string())
                .text(&action)
                .opt_text(symbol.as_deref())
                .decimal(quantity)
                .decimal(price)
                .decimal(Some(amount))
                .text(row.get(settlement_col))
                .finish();

            transactions.push(CanonicalTransaction {
                date,
                kind,
                symbol,
                description,
                quantity,
                price,
                amount,
                fees,
                currency: currency.to_string(),
                fingerprint,
                source_format: self.format(),
                category: None,
                merchant: None,
                is_recurring: false,
                raw_fields: row.raw_fields(&table.headers),
            });
        }

        pair_reinvested_dividends(&mut transactions);
        Ok(ParsedStatement::new(self.format(), transactions, warnings))
    }
}
