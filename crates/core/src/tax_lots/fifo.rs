//! Pure FIFO arithmetic. Persistence lives in the service.

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::tax_lots_model::{LotConsumption, NewTaxLot, TaxLot};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::CalculatorError;
use crate::transactions::Transaction;

/// Outcome of matching a sale quantity against open lots.
#[derive(Debug, Clone, PartialEq)]
pub struct FifoMatch {
    pub consumptions: Vec<LotConsumption>,
    pub matched: Decimal,
    pub shortfall: Decimal,
    pub cost_basis_used: Decimal,
    pub holding_period_days: Option<i64>,
}

/// Lot opened by an acquisition, or `None` when the row cannot carry one
/// (no holding, no units, or no price).
pub fn lot_from_acquisition(tx: &Transaction) -> Result<Option<NewTaxLot>, CalculatorError> {
    if !tx.kind.opens_lot() {
        return Ok(None);
    }
    let (Some(holding_id), Some(price)) = (tx.holding_id.clone(), tx.price) else {
        return Ok(None);
    };
    let quantity = tx.units();
    if quantity <= Decimal::ZERO {
        return Ok(None);
    }

    let overflow = || CalculatorError::Overflow(format!("cost basis of transaction {}", tx.id));
    let cost_basis = quantity
        .checked_mul(price)
        .and_then(|gross| gross.checked_add(tx.fees_or_zero().abs()))
        .ok_or_else(overflow)?
        .round_dp(DECIMAL_PRECISION);
    let cost_per_unit = cost_basis
        .checked_div(quantity)
        .ok_or_else(overflow)?
        .round_dp(DECIMAL_PRECISION);
    Ok(Some(NewTaxLot {
        holding_id,
        source_transaction_id: tx.id.clone(),
        quantity,
        cost_basis,
        cost_per_unit,
        acquired_at: tx.date,
    }))
}

/// Consumes `quantity` from `lots`, oldest acquisition first. Lots sharing an
/// acquisition date keep the order they were given in.
pub fn match_lots_fifo(
    lots: &[TaxLot],
    quantity: Decimal,
    sale_date: NaiveDate,
) -> Result<FifoMatch, CalculatorError> {
    let overflow = || CalculatorError::Overflow(format!("FIFO match of {} units", quantity));
    let mut open: Vec<&TaxLot> = lots.iter().filter(|l| l.is_open()).collect();
    open.sort_by_key(|l| l.acquired_at);

    let mut to_sell = quantity.max(Decimal::ZERO);
    let mut matched = Decimal::ZERO;
    let mut cost_basis_used = Decimal::ZERO;
    let mut weighted_days = Decimal::ZERO;
    let mut consumptions = Vec::new();
    for lot in open {
        if to_sell <= Decimal::ZERO {
            break;
        }
        let take = lot.remaining_quantity.min(to_sell);
        let cost = take.checked_mul(lot.cost_per_unit).ok_or_else(overflow)?;
        let days_held = (sale_date - lot.acquired_at).num_days().max(0);

        matched = matched.checked_add(take).ok_or_else(overflow)?;
        cost_basis_used = cost_basis_used.checked_add(cost).ok_or_else(overflow)?;
        weighted_days = take
            .checked_mul(Decimal::from(days_held))
            .and_then(|d| weighted_days.checked_add(d))
            .ok_or_else(overflow)?;
        consumptions.push(LotConsumption {
            lot_id: lot.id.clone(),
            quantity: take,
            cost,
            days_held,
            remaining_after: lot.remaining_quantity - take,
        });
        to_sell -= take;
    }

    let holding_period_days = if matched > Decimal::ZERO {
        weighted_days
            .checked_div(matched)
            .ok_or_else(overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    } else {
        None
    };

    Ok(FifoMatch {
        consumptions,
        matched,
        shortfall: to_sell,
        cost_basis_used: cost_basis_used.round_dp(DECIMAL_PRECISION),
        holding_period_days,
    })
}
