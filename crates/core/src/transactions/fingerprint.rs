//! Content fingerprints for transaction deduplication.
//!
//! A fingerprint is a SHA-256 hash over a source-defined tuple of row fields.
//! Each statement parser picks its own tuple; the builder only guarantees that
//! the same field values always hash to the same hex string.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use super::CanonicalTransaction;

/// Incremental builder over `|`-separated fields.
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    /// Starts a fingerprint namespaced by the statement source.
    pub fn new(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        Self { hasher }
    }

    pub fn text(mut self, value: &str) -> Self {
        self.hasher.update(b"|");
        self.hasher.update(normalize_description(value).as_bytes());
        self
    }

    pub fn opt_text(self, value: Option<&str>) -> Self {
        self.text(value.unwrap_or_default())
    }

    pub fn decimal(self, value: Option<Decimal>) -> Self {
        let normalized = value.map(normalize_decimal).unwrap_or_default();
        self.text(&normalized)
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Normalize decimal to consistent string format
pub fn normalize_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}

/// Normalize description by trimming and collapsing whitespace
pub fn normalize_description(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Gives repeated fingerprints within one statement a stable occurrence
/// suffix so two identical rows (same day, same trade) stay distinct.
/// The first occurrence keeps its fingerprint unchanged.
pub fn assign_occurrence_suffixes(transactions: &mut [CanonicalTransaction]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for tx in transactions.iter_mut() {
        let count = seen.entry(tx.fingerprint.clone()).or_insert(0);
        if *count > 0 {
            tx.fingerprint = FingerprintBuilder::new(&tx.fingerprint)
                .text(&format!("#{}", count))
                .finish();
        }
        *count += 1;
    }
}
