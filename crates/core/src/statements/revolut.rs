//! Revolut account statement export (oldest row first, one currency per row).

use log::debug;
use rust_decimal::Decimal;

use super::enrichment::{categorize, clean_merchant, mark_recurring};
use super::kind_mapping::{by_sign, infer_kind};
use super::opening_balance::ClosingBalances;
use super::parser_traits::StatementParser;
use super::statement_model::{ParsedStatement, StatementFormat};
use super::table::read_table;
use super::values::{is_empty_row, parse_iso_date, RowNumbers};
use crate::errors::Result;
use crate::transactions::{
    normalize_description, CanonicalTransaction, FingerprintBuilder, TransactionKind,
};

const HEADERS: [&str; 10] = [
    "Type",
    "Product",
    "Started Date",
    "Completed Date",
    "Description",
    "Amount",
    "Fee",
    "Currency",
    "State",
    "Balance",
];

/// States that never moved money.
const NON_TRANSACTION_STATES: [&str; 3] = ["REVERTED", "DECLINED", "FAILED"];

#[derive(Debug, Default, Clone, Copy)]
pub struct RevolutParser;

fn map_type(revolut_type: &str, description: &str, amount: Decimal) -> TransactionKind {
    use TransactionKind::*;
    match revolut_type.trim().to_uppercase().replace(' ', "_").as_str() {
        "TOPUP" => Deposit,
        "CARD_PAYMENT" | "ATM" => Withdrawal,
        "CARD_REFUND" | "REFUND" => Deposit,
        "FEE" => Fee,
        "TRANSFER" => by_sign(amount, TransferIn, TransferOut),
        "EXCHANGE" | "CASHBACK" | "REWARD" => Other,
        "INTEREST" => Interest,
        _ => infer_kind(description, amount),
    }
}

impl StatementParser for RevolutParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Revolut
    }

    fn header_signature(&self) -> &'static [&'static str] {
        &HEADERS
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    fn parse(&self, text: &str, currency: &str) -> Result<ParsedStatement> {
        let table = read_table(text)?;
        let type_col = table.column("Type");
        let product_col = table.column("Product");
        let started_col = table.column("Started Date");
        let completed_col = table.column("Completed Date");
        let description_col = table.column("Description");
        let amount_col = table.column("Amount");
        let fee_col = table.column("Fee");
        let currency_col = table.column("Currency");
        let state_col = table.column("State");
        let balance_col = table.column("Balance");

        let mut warnings = table.warnings.clone();
        let mut transactions = Vec::new();
        let mut balances = ClosingBalances::new();

        for row in &table.rows {
            let state = row.get(state_col).to_uppercase();
            if NON_TRANSACTION_STATES.contains(&state.as_str()) {
                debug!("revolut: skipping {} row {}", state, row.index);
                continue;
            }
            let date = row
                .non_empty(completed_col)
                .and_then(parse_iso_date)
                .or_else(|| parse_iso_date(row.get(started_col)));
            let Some(date) = date else {
                debug!("revolut: skipping non-transaction row {}", row.index);
                continue;
            };

            let row_currency = row
                .non_empty(currency_col)
                .map(str::to_uppercase)
                .unwrap_or_else(|| currency.to_string());
            let description = normalize_description(row.get(description_col));
            let revolut_type = row.get(type_col);

            let mut numbers = RowNumbers::new(row.index, &mut warnings);
            let gross = numbers.parse("Amount", row.get(amount_col));
            let fee = numbers.parse("Fee", row.get(fee_col)).map(|f| f.abs());
            let balance = numbers.parse("Balance", row.get(balance_col));

            // Revolut charges the fee on top of the amount column.
            let fee_paid = fee.unwrap_or(Decimal::ZERO);
            let amount = numbers
                .checked("Amount", gross.unwrap_or(Decimal::ZERO).checked_sub(fee_paid))
                .unwrap_or(Decimal::ZERO);
            let malformed = numbers.malformed();

            if let Some(balance) = balance {
                balances.observe(&row_currency, date, row.index as i64, balance);
            }

            if !malformed && is_empty_row(amount, None) {
                debug!("revolut: skipping zero-amount row {}", row.index);
                continue;
            }

            let kind = map_type(revolut_type, &description, amount);
            let fingerprint = FingerprintBuilder::new(self.format().as_str())
                .text(revolut_type)
                .text(row.get(product_col))
                .text(row.get(started_col))
                .text(row.get(completed_col))
                .text(&description)
                .decimal(gross)
                .decimal(fee)
                .text(&row_currency)
                .finish();

            transactions.push(CanonicalTransaction {
                date,
                kind,
                symbol: None,
                description: description.clone(),
                quantity: None,
                price: None,
                amount,
                fees: fee.filter(|f| !f.is_zero()),
                currency: row_currency,
                fingerprint,
                source_format: self.format(),
                category: categorize(&description),
                merchant: clean_merchant(&description),
                is_recurring: false,
                raw_fields: row.raw_fields(&table.headers),
            });
        }

        mark_recurring(&mut transactions);
        let mut emitted = balances.opening_adjustments(self.format(), &transactions, &mut warnings);
        emitted.extend(transactions);
        Ok(ParsedStatement::new(self.format(), emitted, warnings))
    }
}
