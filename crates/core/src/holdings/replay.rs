//! Average-cost replay of a holding's transaction history.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::holdings_model::HoldingPosition;
use crate::constants::DECIMAL_PRECISION;
use crate::errors::CalculatorError;
use crate::transactions::{Transaction, TransactionKind};

/// Folds transactions, already in replay order, into a position.
///
/// Acquisitions add units and, when priced, cost. Disposals remove cost at the
/// running average. Splits scale units only. Quantity and cost are clamped to
/// zero at the end so malformed histories never yield negative positions.
///
/// Fails with [`CalculatorError::Overflow`] when a value leaves the decimal range.
pub fn replay_position<'a, I>(transactions: I) -> Result<HoldingPosition, CalculatorError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut quantity = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;

    for tx in transactions {
        let units = tx.units();
        let overflow = || CalculatorError::Overflow(format!("replay of transaction {}", tx.id));
        match tx.kind {
            kind if kind.adds_units() => {
                quantity = quantity.checked_add(units).ok_or_else(overflow)?;
                if let Some(price) = tx.price {
                    if units > Decimal::ZERO && price > Decimal::ZERO {
                        let cost = units.checked_mul(price).ok_or_else(overflow)?;
                        total_cost = total_cost.checked_add(cost).ok_or_else(overflow)?;
                    }
                }
            }
            kind if kind.removes_units() => {
                let avg_cost = if quantity > Decimal::ZERO {
                    total_cost.checked_div(quantity).ok_or_else(overflow)?
                } else {
                    Decimal::ZERO
                };
                let released = units.checked_mul(avg_cost).ok_or_else(overflow)?;
                total_cost = total_cost.checked_sub(released).ok_or_else(overflow)?;
                quantity = quantity.checked_sub(units).ok_or_else(overflow)?;
            }
            TransactionKind::Split => {
                if units > Decimal::ZERO {
                    quantity = quantity.checked_mul(units).ok_or_else(overflow)?;
                }
            }
            _ => {}
        }
    }

    let quantity = quantity.max(Decimal::ZERO).round_dp(DECIMAL_PRECISION);
    let cost_basis = total_cost.max(Decimal::ZERO).round_dp(DECIMAL_PRECISION);
    let avg_cost_per_unit = if quantity > Decimal::ZERO {
        (cost_basis / quantity).round_dp(DECIMAL_PRECISION)
    } else {
        Decimal::ZERO
    };

    Ok(HoldingPosition {
        quantity,
        cost_basis,
        avg_cost_per_unit,
    })
}

/// Signed cash per currency. Reinvested dividends are excluded because they
/// never pass through cash.
pub fn cash_balances<'a, I>(transactions: I) -> Result<BTreeMap<String, Decimal>, CalculatorError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut balances = BTreeMap::new();
    for tx in transactions {
        if tx.kind.moves_cash() {
            let balance = balances
                .entry(tx.currency.to_uppercase())
                .or_insert(Decimal::ZERO);
            *balance = balance.checked_add(tx.amount).ok_or_else(|| {
                CalculatorError::Overflow(format!("{} cash balance", tx.currency))
            })?;
        }
    }
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::TransactionKind::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(kind: TransactionKind, qty: Option<Decimal>, price: Option<Decimal>, amount: Decimal) -> Transaction {
        Transaction {
            id: "t".into(),
            account_id: "acc".into(),
            holding_id: Some("h".into()),
            kind,
            symbol: Some("AAPL".into()),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            quantity: qty,
            price,
            amount,
            fees: None,
            currency: "USD".into(),
            fingerprint: String::new(),
            import_batch: None,
            import_source: None,
            category: None,
            merchant: None,
            is_recurring: false,
            raw_fields: None,
            cost_basis_used: None,
            realized_gain_loss: None,
            holding_period_days: None,
            lot_shortfall: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn average_cost_survives_partial_sale() {
        let history = vec![
            tx(Buy, Some(dec!(10)), Some(dec!(10)), dec!(-100)),
            tx(Buy, Some(dec!(10)), Some(dec!(20)), dec!(-200)),
            tx(Sell, Some(dec!(5)), Some(dec!(30)), dec!(150)),
        ];
        let position = replay_position(&history).unwrap();
        assert_eq!(position.quantity, dec!(15));
        assert_eq!(position.cost_basis, dec!(225));
        assert_eq!(position.avg_cost_per_unit, dec!(15));
    }

    #[test]
    fn split_scales_units_but_not_cost() {
        let history = vec![
            tx(Buy, Some(dec!(2)), Some(dec!(500)), dec!(-1000)),
            tx(Split, Some(dec!(10)), None, dec!(0)),
        ];
        let position = replay_position(&history).unwrap();
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.cost_basis, dec!(1000));
        assert_eq!(position.avg_cost_per_unit, dec!(50));
    }

    #[test]
    fn oversold_history_clamps_to_zero() {
        let history = vec![
            tx(Buy, Some(dec!(1)), Some(dec!(10)), dec!(-10)),
            tx(Sell, Some(dec!(3)), Some(dec!(10)), dec!(30)),
        ];
        let position = replay_position(&history).unwrap();
        assert_eq!(position, HoldingPosition::default());
    }

    #[test]
    fn unpriced_transfer_adds_units_without_cost() {
        let history = vec![tx(TransferIn, Some(dec!(5)), None, dec!(0))];
        let position = replay_position(&history).unwrap();
        assert_eq!(position.quantity, dec!(5));
        assert_eq!(position.cost_basis, Decimal::ZERO);
    }

    #[test]
    fn cash_excludes_reinvested_dividends() {
        let history = vec![
            tx(Deposit, None, None, dec!(1000)),
            tx(Buy, Some(dec!(1)), Some(dec!(100)), dec!(-100)),
            tx(ReinvestDividend, Some(dec!(0.1)), Some(dec!(100)), dec!(-10)),
        ];
        let balances = cash_balances(&history).unwrap();
        assert_eq!(balances.get("USD"), Some(&dec!(900)));
    }

    #[test]
    fn oversized_values_fail_instead_of_panicking() {
        let huge = Decimal::from_str_exact("99999999999999999999").unwrap();
        let history = vec![tx(Buy, Some(huge), Some(huge), Decimal::ZERO)];
        let err = replay_position(&history).unwrap_err();
        assert!(matches!(err, CalculatorError::Overflow(_)));

        let deposits = vec![
            tx(Deposit, None, None, Decimal::MAX),
            tx(Deposit, None, None, Decimal::MAX),
        ];
        assert!(cash_balances(&deposits).is_err());
    }
}
