//! Conversions between domain values and their SQLite text columns.

use std::str::FromStr;

use chrono::NaiveDate;
use log::error;
use rust_decimal::Decimal;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical text for a decimal column: no trailing zeros, no exponent.
pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn opt_decimal_to_text(value: Option<Decimal>) -> Option<String> {
    value.map(decimal_to_text)
}

/// Parses a stored decimal. Corrupt values are logged and read as zero so a
/// single bad row cannot make a whole ledger unreadable.
pub fn text_to_decimal(value: &str, field_name: &str) -> Decimal {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .unwrap_or_else(|e| {
            error!("Failed to parse {} '{}' as Decimal: {}", field_name, value, e);
            Decimal::ZERO
        })
}

pub fn opt_text_to_decimal(value: Option<&str>, field_name: &str) -> Option<Decimal> {
    value.map(|v| text_to_decimal(v, field_name))
}

pub fn date_to_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn text_to_date(value: &str, field_name: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, DATE_FORMAT).unwrap_or_else(|e| {
        error!("Failed to parse {} '{}' as date: {}", field_name, value, e);
        NaiveDate::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimals_are_stored_normalized() {
        assert_eq!(decimal_to_text(dec!(170.100)), "170.1");
        assert_eq!(decimal_to_text(dec!(-0.00)), "0");
        assert_eq!(text_to_decimal("1.5e2", "amount"), dec!(150));
        assert_eq!(text_to_decimal("garbage", "amount"), Decimal::ZERO);
    }

    #[test]
    fn dates_sort_as_text() {
        let a = date_to_text(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
        let b = date_to_text(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert!(a < b);
        assert_eq!(text_to_date(&a, "date"), NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
    }
}
