//! Monzo transaction export. No running balance; categories come with the rows.

use log::debug;
use rust_decimal::Decimal;

use super::enrichment::{categorize, clean_merchant, mark_recurring};
use super::kind_mapping::{by_sign, infer_kind};
use super::parser_traits::StatementParser;
use super::statement_model::{ParsedStatement, StatementFormat};
use super::table::read_table;
use super::values::{is_empty_row, parse_uk_date, RowNumbers};
use crate::errors::Result;
use crate::transactions::{
    normalize_description, CanonicalTransaction, FingerprintBuilder, TransactionKind,
};

const HEADERS: [&str; 9] = [
    "Transaction ID",
    "Date",
    "Time",
    "Type",
    "Name",
    "Emoji",
    "Category",
    "Amount",
    "Currency",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MonzoParser;

fn map_type(monzo_type: &str, context: &str, amount: Decimal) -> TransactionKind {
    use TransactionKind::*;
    match monzo_type.trim().to_lowercase().as_str() {
        "card payment" | "direct debit" => Withdrawal,
        "bacs (direct credit)" => Deposit,
        "faster payment" | "monzo-to-monzo" | "p2p payment" => {
            by_sign(amount, Deposit, Withdrawal)
        }
        "pot transfer" => by_sign(amount, TransferIn, TransferOut),
        "interest" | "account interest" => Interest,
        _ => infer_kind(&format!("{} {}", monzo_type, context), amount),
    }
}

/// `eating_out` -> `Eating out`.
fn humanize_category(raw: &str) -> Option<String> {
    let words = raw.trim().replace('_', " ");
    let mut chars = words.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

impl StatementParser for MonzoParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Monzo
    }

    fn header_signature(&self) -> &'static [&'static str] {
        &HEADERS
    }

    fn date_format(&self) -> &'static str {
        "%d/%m/%Y"
    }

    fn parse(&self, text: &str, currency: &str) -> Result<ParsedStatement> {
        let table = read_table(text)?;
        let id_col = table.column("Transaction ID");
        let date_col = table.column("Date");
        let time_col = table.column("Time");
        let type_col = table.column("Type");
        let name_col = table.column("Name");
        let category_col = table.column("Category");
        let amount_col = table.column("Amount");
        let currency_col = table.column("Currency");
        let description_col = table.column("Description");

        let mut warnings = table.warnings.clone();
        let mut transactions = Vec::new();

        for row in &table.rows {
            let Some(date) = parse_uk_date(row.get(date_col)) else {
                debug!("monzo: skipping non-transaction row {}", row.index);
                continue;
            };
            let monzo_type = row.get(type_col);
            let name = normalize_description(row.get(name_col));
            let free_text = normalize_description(row.get(description_col));
            let description = if free_text.is_empty() {
                name.clone()
            } else {
                free_text
            };

            let mut numbers = RowNumbers::new(row.index, &mut warnings);
            let parsed_amount = numbers.parse("Amount", row.get(amount_col));
            let malformed = numbers.malformed();
            let amount = parsed_amount.unwrap_or(Decimal::ZERO);

            if !malformed && is_empty_row(amount, None) {
                debug!("monzo: skipping zero-amount row {}", row.index);
                continue;
            }

            let row_currency = row
                .non_empty(currency_col)
                .map(str::to_uppercase)
                .unwrap_or_else(|| currency.to_string());
            let kind = map_type(monzo_type, &description, amount);

            let fingerprint = match row.non_empty(id_col) {
                Some(id) => FingerprintBuilder::new(self.format().as_str()).text(id).finish(),
                None => FingerprintBuilder::new(self.format().as_str())
                    .text(&date.to_string())
                    .text(row.get(time_col))
                    .text(&name)
                    .decimal(Some(amount))
                    .finish(),
            };

            let merchant = if name.is_empty() {
                clean_merchant(&description)
            } else {
                Some(name.clone())
            };
            let category = row
                .non_empty(category_col)
                .and_then(humanize_category)
                .or_else(|| categorize(&description));

            transactions.push(CanonicalTransaction {
                date,
                kind,
                symbol: None,
                description,
                quantity: None,
                price: None,
                amount,
                fees: None,
                currency: row_currency,
                fingerprint,
                source_format: self.format(),
                category,
                merchant,
                is_recurring: monzo_type.eq_ignore_ascii_case("direct debit"),
                raw_fields: row.raw_fields(&table.headers),
            });
        }

        mark_recurring(&mut transactions);
        Ok(ParsedStatement::new(self.format(), transactions, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const EXPORT: &str = "Transaction ID,Date,Time,Type,Name,Emoji,Category,Amount,Currency,Local amount,Local currency,Notes and #tags,Address,Receipt,Description,Category split,Money Out,Money In
tx_0001,01/03/2024,08:15:02,Card payment,Pret A Manger,,eating_out,-4.20,GBP,-4.20,GBP,,,,PRET A MANGER LONDON,,-4.20,
tx_0002,02/03/2024,00:01:00,Direct Debit,Thames Water,,bills,-38.00,GBP,-38.00,GBP,,,,THAMES WATER,,-38.00,
tx_0003,03/03/2024,12:00:00,Pot transfer,Savings,,savings,-100.00,GBP,-100.00,GBP,,,,,,-100.00,
tx_0004,04/03/2024,12:00:00,Card payment,Active card check,,general,0.00,GBP,0.00,GBP,,,,,,,
";

    #[test]
    fn parses_uk_dates_categories_and_direct_debits() {
        let parsed = MonzoParser.parse(EXPORT, "GBP").unwrap();
        let txs = &parsed.transactions;
        assert_eq!(txs.len(), 3);

        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(txs[0].kind, TransactionKind::Withdrawal);
        assert_eq!(txs[0].category.as_deref(), Some("Eating out"));
        assert_eq!(txs[0].merchant.as_deref(), Some("Pret A Manger"));
        assert_eq!(txs[0].amount, dec!(-4.20));

        assert!(txs[1].is_recurring);
        assert_eq!(txs[2].kind, TransactionKind::TransferOut);
    }

    #[test]
    fn fingerprint_comes_from_transaction_id() {
        let parsed = MonzoParser.parse(EXPORT, "GBP").unwrap();
        let expected = FingerprintBuilder::new("monzo").text("tx_0001").finish();
        assert_eq!(parsed.transactions[0].fingerprint, expected);
    }

    #[test]
    fn monzo_header_is_not_taken_for_generic() {
        assert!(MonzoParser.detect(EXPORT));
        assert!(!super::super::GenericParser.detect(EXPORT));
    }
}
