//! Per-portfolio write serialization.
//!
//! Imports, rollbacks, replays and tax-lot passes read derived state and write
//! it back. Two of them running against the same portfolio would both consume
//! the same lots, so mutating handlers hold the portfolio's lock for the whole
//! call. Different portfolios proceed in parallel.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

#[derive(Default)]
pub struct PortfolioLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held locks. Released on drop.
pub struct PortfolioGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl PortfolioLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the map, recovering from poison. The map only ever gains
    /// entries, so a poisoned map is still consistent.
    fn lock_map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| {
            warn!("Portfolio lock map mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn entry(&self, portfolio_id: &str) -> Arc<AsyncMutex<()>> {
        self.lock_map()
            .entry(portfolio_id.to_string())
            .or_default()
            .clone()
    }

    /// Waits for exclusive access to one portfolio.
    pub async fn lock(&self, portfolio_id: &str) -> PortfolioGuard {
        self.lock_all([portfolio_id.to_string()]).await
    }

    /// Waits for exclusive access to every listed portfolio. Locks are taken
    /// in sorted order so overlapping callers cannot deadlock.
    pub async fn lock_all<I>(&self, portfolio_ids: I) -> PortfolioGuard
    where
        I: IntoIterator<Item = String>,
    {
        let ordered: BTreeSet<String> = portfolio_ids.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for portfolio_id in &ordered {
            guards.push(self.entry(portfolio_id).lock_owned().await);
            debug!("Acquired write lock for portfolio {}", portfolio_id);
        }
        PortfolioGuard { _guards: guards }
    }
}
