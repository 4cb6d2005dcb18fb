//! Field-level parsing helpers for dates and money columns.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::statement_model::ParseWarning;

/// `MM/DD/YYYY`, taking the first date of Schwab's "MM/DD/YYYY as of MM/DD/YYYY".
pub(crate) fn parse_us_date(raw: &str) -> Option<NaiveDate> {
    let first = raw.split(" as of ").next().unwrap_or_default().trim();
    NaiveDate::parse_from_str(first, "%m/%d/%Y").ok()
}

/// `DD/MM/YYYY`.
pub(crate) fn parse_uk_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// `YYYY-MM-DD`, also accepting a trailing time component.
pub(crate) fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parses a money or quantity column.
///
/// Accepts currency symbols, thousands separators, a leading `+`, and
/// accounting-style parentheses for negatives. Blank and `--` mean absent.
pub(crate) fn parse_money(raw: &str) -> Result<Option<Decimal>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "--" {
        return Ok(None);
    }

    let (negated, inner) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | '£' | '€' | ',' | ' ' | '"' | '+' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return Err(format!("invalid number '{}'", raw));
    }

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| format!("invalid number '{}'", raw))?;

    Ok(Some(if negated { -value } else { value }))
}

/// Parses numeric fields of one row, recording failures as warnings.
pub(crate) struct RowNumbers<'a> {
    row: usize,
    warnings: &'a mut Vec<ParseWarning>,
    malformed: bool,
}

impl<'a> RowNumbers<'a> {
    pub fn new(row: usize, warnings: &'a mut Vec<ParseWarning>) -> Self {
        Self {
            row,
            warnings,
            malformed: false,
        }
    }

    pub fn parse(&mut self, column: &str, raw: &str) -> Option<Decimal> {
        match parse_money(raw) {
            Ok(value) => value,
            Err(message) => {
                self.record(column, message);
                None
            }
        }
    }

    /// Passes `value` through, recording a warning when a computation on
    /// this row's fields left the decimal range (`None`).
    pub fn checked(&mut self, column: &str, value: Option<Decimal>) -> Option<Decimal> {
        if value.is_none() {
            self.record(column, "value out of range".to_string());
        }
        value
    }

    fn record(&mut self, column: &str, message: String) {
        log::warn!("Row {} column {}: {}", self.row, column, message);
        self.warnings.push(ParseWarning {
            row: self.row,
            message: format!("{}: {}", column, message),
        });
        self.malformed = true;
    }

    /// True when at least one field failed to parse.
    pub fn malformed(&self) -> bool {
        self.malformed
    }
}

/// Rows with no cash effect and no units carry nothing to import.
pub(crate) fn is_empty_row(amount: Decimal, quantity: Option<Decimal>) -> bool {
    amount.is_zero() && quantity.map_or(true, |q| q.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_us_dates_with_as_of_suffix() {
        assert_eq!(
            parse_us_date("03/15/2024 as of 03/14/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_us_date("Transactions Total"), None);
    }

    #[test]
    fn parses_uk_and_iso_dates() {
        assert_eq!(parse_uk_date("15/03/2024"), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(
            parse_iso_date("2024-03-15 10:22:01"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_iso_date("15/03/2024"), None);
    }

    #[test]
    fn parses_money_variants() {
        assert_eq!(parse_money("$1,234.56"), Ok(Some(dec!(1234.56))));
        assert_eq!(parse_money("-$12.00"), Ok(Some(dec!(-12.00))));
        assert_eq!(parse_money("($7.50)"), Ok(Some(dec!(-7.50))));
        assert_eq!(parse_money("+3"), Ok(Some(dec!(3))));
        assert_eq!(parse_money(""), Ok(None));
        assert_eq!(parse_money("--"), Ok(None));
        assert!(parse_money("n/a").is_err());
    }

    #[test]
    fn malformed_fields_become_warnings() {
        let mut warnings = Vec::new();
        let mut numbers = RowNumbers::new(4, &mut warnings);
        assert_eq!(numbers.parse("Amount", "abc"), None);
        assert!(numbers.malformed());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row, 4);
    }

    #[test]
    fn out_of_range_results_become_warnings() {
        let mut warnings = Vec::new();
        let mut numbers = RowNumbers::new(2, &mut warnings);
        assert_eq!(numbers.checked("Amount", Some(dec!(1))), Some(dec!(1)));
        assert!(!numbers.malformed());
        assert_eq!(numbers.checked("Amount", Decimal::MAX.checked_add(Decimal::ONE)), None);
        assert!(numbers.malformed());
        assert_eq!(warnings[0].message, "Amount: value out of range");
    }
}
