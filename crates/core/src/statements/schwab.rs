//! Charles Schwab brokerage transaction export.

use log::debug;
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

const HEADERS: [&str; 8] = [
    "Date",
    "Action",
    "Symbol",
    "Description",
    "Quantity",
    "Price",
    "Fees & Comm",
    "Amount",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct SchwabParser;

/// Direct lookup of Schwab action labels. `direction` is the amount, or the
/// signed quantity for share-only rows.
fn map_action(action: &str, description: &str, direction: Decimal) -> TransactionKind {
    use TransactionKind::*;
    match action.to_lowercase().as_str() {
        "buy" | "buy to open" | "buy to close" => Buy,
        "sell" | "sell to open" | "sell to close" | "sell short" => Sell,
        "reinvest shares" | "reinvest dividend" | "qual div reinvest" | "div reinvest" => {
            ReinvestDividend
        }
        "qualified dividend" | "cash dividend" | "non-qualified div" | "pr yr cash div"
        | "special dividend" | "pr yr div reinvest" => Dividend,
        "bank interest" | "credit interest" | "bond interest" | "margin interest" => Interest,
        "wire funds received" | "wire received" | "funds received" => Deposit,
        "wire funds" | "wire sent" => Withdrawal,
        "moneylink transfer" | "moneylink deposit" => by_sign(direction, Deposit, Withdrawal),
        "journal" | "journaled shares" | "internal transfer" | "security transfer" => {
            by_sign(direction, TransferIn, TransferOut)
        }
        // Schwab reports the distributed shares, not the ratio.
        "stock split" => TransferIn,
        "nra tax adj" | "nra withholding" | "foreign tax paid" => TaxWithholding,
        "adr mgmt fee" | "service fee" | "wire fee" => Fee,
        "cash in lieu" => Other,
        "adjustment" => Adjustment,
        _ => infer_kind(&format!("{} {}", action, description), direction),
    }
}

impl StatementParser for SchwabParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Schwab
    }

    fn header_signature(&self) -> &'static [&'static str] {
        &HEADERS
    }

    fn date_format(&self) -> &'static str {
        "%m/%d/%Y"
    }

    fn parse(&self, text: &str, currency: &str) -> Result<ParsedStatement> {
        let table = read_table(text)?;
        let date_col = table.column("Date");
        let action_col = table.column("Action");
        let symbol_col = table.column("Symbol");
        let description_col = table.column("Description");
        let quantity_col = table.column("Quantity");
        let price_col = table.column("Price");
        let fees_col = table.column("Fees & Comm");
        let amount_col = table.column("Amount");

        let mut warnings = table.warnings.clone();
        let mut transactions = Vec::new();

        for row in &table.rows {
            let Some(date) = parse_us_date(row.get(date_col)) else {
                debug!("schwab: skipping non-transaction row {}", row.index);
                continue;
            };
            let action = row.get(action_col);
            let symbol = row.non_empty(symbol_col).map(str::to_uppercase);
            let description = normalize_description(row.get(description_col));

            let mut numbers = RowNumbers::new(row.index, &mut warnings);
            let signed_quantity = numbers.parse("Quantity", row.get(quantity_col));
            let price = numbers.parse("Price", row.get(price_col));
            let fees = numbers.parse("Fees & Comm", row.get(fees_col)).map(|f| f.abs());
            let parsed_amount = numbers.parse("Amount", row.get(amount_col));
            let malformed = numbers.malformed();
            let amount = parsed_amount.unwrap_or(Decimal::ZERO);
            let quantity = signed_quantity.map(|q| q.abs());

            if !malformed && is_empty_row(amount, quantity) {
                debug!("schwab: skipping empty row {}", row.index);
                continue;
            }

            let direction = if amount.is_zero() {
                signed_quantity.unwrap_or(Decimal::ZERO)
            } else {
                amount
            };
            let kind = map_action(action, &description, direction);

            let fingerprint = FingerprintBuilder::new(self.format().as_str())
                .text(&date.to_string())
                .text(action)
                .opt_text(symbol.as_deref())
                .text(&description)
                .decimal(quantity)
                .decimal(price)
                .decimal(Some(amount))
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

        Ok(ParsedStatement::new(self.format(), transactions, warnings))
    }
}
