//! Hand-built template import: `Date,Type,Symbol,Description,Quantity,Price,Fees,Amount,Currency`.
//!
//! Used for brokers without a dedicated parser. The `Type` column takes the
//! canonical kind labels (`BUY`, `REINVEST_DIVIDEND`, ...); anything else goes
//! through the keyword heuristics. SPLIT rows carry the split factor in
//! `Quantity`.

use log::debug;
use rust_decimal::Decimal;

use super::kind_mapping::infer_kind;
use super::parser_traits::StatementParser;
use super::statement_model::{ParsedStatement, StatementFormat};
use super::table::read_table;
use super::values::{is_empty_row, parse_iso_date, RowNumbers};
use crate::errors::Result;
use crate::transactions::{
    normalize_description, CanonicalTransaction, FingerprintBuilder, TransactionKind,
};

const HEADERS: [&str; 9] = [
    "Date",
    "Type",
    "Symbol",
    "Description",
    "Quantity",
    "Price",
    "Fees",
    "Amount",
    "Currency",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct GenericParser;

/// Cash effect of a trade row that left `Amount` blank. `None` when the row
/// is not a priced trade or the result is out of range.
fn derived_amount(
    kind: TransactionKind,
    quantity: Option<Decimal>,
    price: Option<Decimal>,
    fees: Option<Decimal>,
    numbers: &mut RowNumbers<'_>,
) -> Option<Decimal> {
    if !matches!(kind, TransactionKind::Buy | TransactionKind::Sell) {
        return None;
    }
    let (quantity, price) = (quantity?, price?);
    let fees = fees.unwrap_or(Decimal::ZERO);
    let amount = quantity.checked_mul(price).and_then(|gross| match kind {
        TransactionKind::Buy => gross.checked_add(fees).map(|cost| -cost),
        _ => gross.checked_sub(fees),
    });
    numbers.checked("Amount", amount)
}

impl StatementParser for GenericParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Generic
    }

    fn header_signature(&self) -> &'static [&'static str] {
        &HEADERS
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d"
    }

    fn parse(&self, text: &str, currency: &str) -> Result<ParsedStatement> {
        let table = read_table(text)?;
        let date_col = table.column("Date");
        let type_col = table.column("Type");
        let symbol_col = table.column("Symbol");
        let description_col = table.column("Description");
        let quantity_col = table.column("Quantity");
        let price_col = table.column("Price");
        let fees_col = table.column("Fees");
        let amount_col = table.column("Amount");
        let currency_col = table.column("Currency");

        let mut warnings = table.warnings.clone();
        let mut transactions = Vec::new();

        for row in &table.rows {
            let Some(date) = parse_iso_date(row.get(date_col)) else {
                debug!("generic: skipping non-transaction row {}", row.index);
                continue;
            };
            let label = row.get(type_col);
            let symbol = row.non_empty(symbol_col).map(str::to_uppercase);
            let description = normalize_description(row.get(description_col));

            let mut numbers = RowNumbers::new(row.index, &mut warnings);
            let quantity = numbers.parse("Quantity", row.get(quantity_col)).map(|q| q.abs());
            let price = numbers.parse("Price", row.get(price_col));
            let fees = numbers.parse("Fees", row.get(fees_col)).map(|f| f.abs());
            let parsed_amount = numbers.parse("Amount", row.get(amount_col));

            let kind = label.parse::<TransactionKind>().unwrap_or_else(|_| {
                infer_kind(
                    &format!("{} {}", label, description),
                    parsed_amount.unwrap_or(Decimal::ZERO),
                )
            });
            let amount = match parsed_amount {
                Some(amount) => amount,
                None => derived_amount(kind, quantity, price, fees, &mut numbers)
                    .unwrap_or(Decimal::ZERO),
            };
            let malformed = numbers.malformed();

            if !malformed && is_empty_row(amount, quantity) {
                debug!("generic: skipping empty row {}", row.index);
                continue;
            }

            let row_currency = row
                .non_empty(currency_col)
                .map(str::to_uppercase)
                .unwrap_or_else(|| currency.to_string());

            let fingerprint = FingerprintBuilder::new(self.format().as_str())
                .text(&date.to_string())
                .text(kind.as_str())
                .opt_text(symbol.as_deref())
                .decimal(quantity)
                .decimal(price)
                .decimal(fees)
                .decimal(Some(amount))
                .text(&row_currency)
                .text(&description)
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
                currency: row_currency,
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
