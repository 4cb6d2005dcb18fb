/// Decimal places kept for computed quantities, per-unit costs and money values.
pub const DECIMAL_PRECISION: u32 = 8;

/// Quantities below this magnitude are treated as zero.
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Symbol prefix of the synthetic per-currency cash holding (`CASH.USD`).
pub const CASH_SYMBOL_PREFIX: &str = "CASH.";

/// Description given to the synthesized opening-balance adjustment.
pub const OPENING_BALANCE_DESCRIPTION: &str = "Opening balance";

/// Currencies whose minor unit has three decimal places.
pub const THREE_DECIMAL_CURRENCIES: [&str; 7] = ["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Default currency used when neither the caller nor the account provides one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Builds the cash holding symbol for a currency.
pub fn cash_symbol(currency: &str) -> String {
    format!("{}{}", CASH_SYMBOL_PREFIX, currency.to_uppercase())
}
