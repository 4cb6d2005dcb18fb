//! Chase checking account activity export (newest row first).

use log::debug;
use rust_decimal::Decimal;

use super::enrichment::{categorize, clean_merchant, mark_recurring};
use super::kind_mapping::{by_sign, infer_kind};
use super::opening_balance::ClosingBalances;
use super::parser_traits::StatementParser;
use super::statement_model::{ParsedStatement, StatementFormat};
use super::table::read_table;
use super::values::{is_empty_row, parse_us_date, RowNumbers};
use crate::errors::Result;
use crate::transactions::{
    normalize_description, CanonicalTransaction, FingerprintBuilder, TransactionKind,
};

const HEADERS: [&str; 6] = [
    "Details",
    "Posting Date",
    "Description",
    "Amount",
    "Type",
    "Balance",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct ChaseParser;

fn map_type(chase_type: &str, description: &str, amount: Decimal) -> TransactionKind {
    use TransactionKind::*;
    match chase_type.trim().to_uppercase().as_str() {
        "ACH_CREDIT" | "QUICKPAY_CREDIT" | "CHECK_DEPOSIT" | "WIRE_INCOMING"
        | "PARTNERFI_TO_CHASE" | "REFUND_TRANSACTION" => Deposit,
        "ACH_DEBIT" | "DEBIT_CARD" | "ATM" | "CHECK_PAID" | "QUICKPAY_DEBIT" | "WIRE_OUTGOING"
        | "BILLPAY" | "LOAN_PMT" | "CHASE_TO_PARTNERFI" => Withdrawal,
        "FEE_TRANSACTION" | "ATM_FEE" => Fee,
        "ACCT_XFER" => by_sign(amount, TransferIn, TransferOut),
        _ => infer_kind(description, amount),
    }
}

impl StatementParser for ChaseParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Chase
    }

    fn header_signature(&self) -> &'static [&'static str] {
        &HEADERS
    }

    fn date_format(&self) -> &'static str {
        "%m/%d/%Y"
    }

    fn parse(&self, text: &str, currency: &str) -> Result<ParsedStatement> {
        let table = read_table(text)?;
        let details_col = table.column("Details");
        let date_col = table.column("Posting Date");
        let description_col = table.column("Description");
        let amount_col = table.column("Amount");
        let type_col = table.column("Type");
        let balance_col = table.column("Balance");

        let mut warnings = table.warnings.clone();
        let mut transactions = Vec::new();
        let mut balances = ClosingBalances::new();

        for row in &table.rows {
            let Some(date) = parse_us_date(row.get(date_col)) else {
                debug!("chase: skipping non-transaction row {}", row.index);
                continue;
            };
            let description = normalize_description(row.get(description_col));
            let chase_type = row.get(type_col);

            let mut numbers = RowNumbers::new(row.index, &mut warnings);
            let parsed_amount = numbers.parse("Amount", row.get(amount_col));
            let balance = numbers.parse("Balance", row.get(balance_col));
            let malformed = numbers.malformed();
            let amount = parsed_amount.unwrap_or(Decimal::ZERO);

            if let Some(balance) = balance {
                // Newest first: earlier rows in the file are later in the day.
                balances.observe(currency, date, -(row.index as i64), balance);
            }

            if !malformed && is_empty_row(amount, None) {
                debug!("chase: skipping zero-amount row {}", row.index);
                continue;
            }

            let kind = map_type(chase_type, &description, amount);
            let fingerprint = FingerprintBuilder::new(self.format().as_str())
                .text(&date.to_string())
                .text(row.get(details_col))
                .text(&description)
                .decimal(Some(amount))
                .text(chase_type)
                .decimal(balance)
                .finish();

            transactions.push(CanonicalTransaction {
                date,
                kind,
                symbol: None,
                description: description.clone(),
                quantity: None,
                price: None,
                amount,
                fees: None,
                currency: currency.to_string(),
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
