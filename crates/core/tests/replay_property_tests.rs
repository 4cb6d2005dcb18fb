//! Property-based tests for the holdings replay and FIFO lot matching.
//!
//! Histories are generated at random, including malformed ones that sell
//! more than was ever bought.

use chrono::{Duration, NaiveDate};
use ledgerfolio_core::holdings::replay_position;
use ledgerfolio_core::tax_lots::{match_lots_fifo, TaxLot};
use ledgerfolio_core::transactions::{Transaction, TransactionKind};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

fn arb_kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::Buy),
        Just(TransactionKind::Sell),
        Just(TransactionKind::TransferIn),
        Just(TransactionKind::TransferOut),
        Just(TransactionKind::ReinvestDividend),
        Just(TransactionKind::Split),
        Just(TransactionKind::Dividend),
        Just(TransactionKind::Fee),
    ]
}

/// Decimal with two places in `0..max/100`.
fn arb_amount(max: i64) -> impl Strategy<Value = Decimal> {
    (0..max).prop_map(|cents| Decimal::new(cents, 2))
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (
        arb_kind(),
        0i64..365,
        proptest::option::of(arb_amount(100_000)),
        proptest::option::of(arb_amount(50_000)),
    )
        .prop_map(|(kind, offset, quantity, price)| {
            let date = base_date() + Duration::days(offset);
            // Keep compounding split factors small.
            let quantity = if kind == TransactionKind::Split {
                quantity.map(|q| q.round() % Decimal::from(3) + Decimal::ONE)
            } else {
                quantity
            };
            Transaction {
                id: format!("tx-{}", offset),
                account_id: "acc".to_string(),
                holding_id: Some("h".to_string()),
                kind,
                symbol: Some("AAPL".to_string()),
                description: String::new(),
                date,
                quantity,
                price,
                amount: Decimal::ZERO,
                fees: None,
                currency: "USD".to_string(),
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
                created_at: date.and_hms_opt(0, 0, 0).unwrap(),
            }
        })
}

fn arb_history() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(arb_transaction(), 0..40).prop_map(|mut txs| {
        txs.sort_by_key(|t| t.date);
        txs
    })
}

fn arb_lot() -> impl Strategy<Value = TaxLot> {
    (0i64..365, arb_amount(10_000), arb_amount(10_000), arb_amount(50_000)).prop_map(
        |(offset, original, consumed, cost_per_unit)| {
            let acquired_at = base_date() + Duration::days(offset);
            TaxLot {
                id: format!("lot-{}-{}", offset, original),
                holding_id: "h".to_string(),
                source_transaction_id: format!("tx-{}", offset),
                original_quantity: original,
                remaining_quantity: (original - consumed).max(Decimal::ZERO),
                cost_basis: original * cost_per_unit,
                cost_per_unit,
                acquired_at,
                created_at: acquired_at.and_hms_opt(0, 0, 0).unwrap(),
            }
        },
    )
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn replay_never_goes_negative(history in arb_history()) {
        let position = replay_position(&history).unwrap();
        prop_assert!(position.quantity >= Decimal::ZERO);
        prop_assert!(position.cost_basis >= Decimal::ZERO);
        prop_assert!(position.avg_cost_per_unit >= Decimal::ZERO);
        if position.quantity.is_zero() {
            prop_assert!(position.avg_cost_per_unit.is_zero());
        }
    }

    #[test]
    fn replay_is_deterministic(history in arb_history()) {
        prop_assert_eq!(replay_position(&history).unwrap(), replay_position(&history).unwrap());
    }

    #[test]
    fn fifo_conserves_quantity(
        lots in prop::collection::vec(arb_lot(), 0..10),
        quantity in arb_amount(100_000),
    ) {
        let sale_date = base_date() + Duration::days(400);
        let open_before: Decimal = lots.iter().map(|l| l.remaining_quantity).sum();
        let result = match_lots_fifo(&lots, quantity, sale_date).unwrap();

        prop_assert_eq!(result.matched + result.shortfall, quantity);
        prop_assert!(result.matched <= open_before);

        let consumed: Decimal = result.consumptions.iter().map(|c| c.quantity).sum();
        prop_assert_eq!(consumed, result.matched);
        for c in &result.consumptions {
            prop_assert!(c.quantity > Decimal::ZERO);
            prop_assert!(c.remaining_after >= Decimal::ZERO);
        }
        if result.shortfall > Decimal::ZERO {
            prop_assert_eq!(result.matched, open_before);
        }
    }

    #[test]
    fn fifo_consumes_oldest_first(
        lots in prop::collection::vec(arb_lot(), 1..10),
        quantity in arb_amount(100_000),
    ) {
        let sale_date = base_date() + Duration::days(400);
        let result = match_lots_fifo(&lots, quantity, sale_date).unwrap();
        let dates: Vec<NaiveDate> = result
            .consumptions
            .iter()
            .map(|c| lots.iter().find(|l| l.id == c.lot_id).unwrap().acquired_at)
            .collect();
        prop_assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        // Every lot except possibly the last one touched is emptied.
        if let Some((_, rest)) = result.consumptions.split_last() {
            prop_assert!(rest.iter().all(|c| c.remaining_after.is_zero()));
        }
    }
}
