use rust_decimal::Decimal;

use crate::transactions::TransactionKind;

/// Picks `inflow` for non-negative values and `outflow` otherwise.
pub(crate) fn by_sign(
    value: Decimal,
    inflow: TransactionKind,
    outflow: TransactionKind,
) -> TransactionKind {
    if value.is_sign_negative() && !value.is_zero() {
        outflow
    } else {
        inflow
    }
}

/// Keyword heuristics for action or description text no lookup table knows.
///
/// Matching is on word prefixes so "COFFEE" never reads as a fee. When
/// nothing matches, the amount sign decides between DEPOSIT and WITHDRAWAL,
/// so a row is never dropped for an unknown label.
pub fn infer_kind(text: &str, amount: Decimal) -> TransactionKind {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |prefix: &str| words.iter().any(|w| w.starts_with(prefix));
    let is = |word: &str| words.iter().any(|w| *w == word);

    if has("dividend") && has("reinvest") {
        TransactionKind::ReinvestDividend
    } else if has("dividend") {
        TransactionKind::Dividend
    } else if has("interest") {
        TransactionKind::Interest
    } else if has("journal") || has("transfer") {
        by_sign(amount, TransactionKind::TransferIn, TransactionKind::TransferOut)
    } else if has("tax") || has("withholding") {
        TransactionKind::TaxWithholding
    } else if is("fee") || is("fees") {
        TransactionKind::Fee
    } else if is("buy") || is("bought") {
        TransactionKind::Buy
    } else if is("sell") || is("sold") {
        TransactionKind::Sell
    } else {
        by_sign(amount, TransactionKind::Deposit, TransactionKind::Withdrawal)
    }
}
