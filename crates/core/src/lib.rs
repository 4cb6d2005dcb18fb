//! Ledgerfolio Core - Domain entities, services, and traits.
//!
//! This crate contains the statement import pipeline, the holdings replay
//! engine and the FIFO tax-lot engine. It is database-agnostic and defines
//! traits that are implemented by the `storage-sqlite` crate.

pub mod accounts;
pub mod constants;
pub mod errors;
pub mod holdings;
pub mod imports;
pub mod statements;
pub mod tax_lots;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
