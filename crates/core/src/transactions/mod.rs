//! Canonical transaction ledger - the record shape every statement parser
//! produces and every derived view is replayed from.

mod fingerprint;
mod transactions_model;
mod transactions_traits;

pub use fingerprint::{
    assign_occurrence_suffixes, normalize_decimal, normalize_description, FingerprintBuilder,
};
pub use transactions_model::{
    CanonicalTransaction, NaturalKey, NewTransaction, SaleResult, Transaction, TransactionKind,
};
pub use transactions_traits::TransactionRepositoryTrait;
