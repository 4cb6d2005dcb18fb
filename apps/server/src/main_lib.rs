use std::sync::Arc;

use ledgerfolio_core::{
    accounts::{AccountService, AccountServiceTrait},
    holdings::{HoldingsService, HoldingsServiceTrait},
    imports::{ImportService, ImportServiceTrait},
    tax_lots::{TaxLotService, TaxLotServiceTrait},
};
use ledgerfolio_storage_sqlite::{
    accounts::AccountRepository,
    db::{self, write_actor},
    holdings::HoldingRepository,
    tax_lots::TaxLotRepository,
    transactions::TransactionRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::locks::PortfolioLocks;

pub struct AppState {
    pub account_service: Arc<dyn AccountServiceTrait>,
    pub holdings_service: Arc<dyn HoldingsServiceTrait>,
    pub tax_lot_service: Arc<dyn TaxLotServiceTrait>,
    pub import_service: Arc<dyn ImportServiceTrait>,
    /// Held by every handler that rewrites a portfolio's derived state.
    pub portfolio_locks: PortfolioLocks,
}

/// Installs the global subscriber. Records emitted through the `log` facade
/// by the library crates are forwarded to it.
pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let account_repo = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let transaction_repo = Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let holding_repo = Arc::new(HoldingRepository::new(pool.clone(), writer.clone()));
    let tax_lot_repo = Arc::new(TaxLotRepository::new(pool.clone(), writer.clone()));

    let account_service = Arc::new(AccountService::new(account_repo.clone()));
    let holdings_service = Arc::new(HoldingsService::new(
        holding_repo.clone(),
        transaction_repo.clone(),
        tax_lot_repo.clone(),
    ));
    let tax_lot_service = Arc::new(TaxLotService::new(
        account_repo.clone(),
        transaction_repo.clone(),
        holding_repo,
        tax_lot_repo,
    ));
    let import_service = Arc::new(ImportService::new(
        account_repo,
        transaction_repo,
        holdings_service.clone(),
        tax_lot_service.clone(),
    ));

    Ok(Arc::new(AppState {
        account_service,
        holdings_service,
        tax_lot_service,
        import_service,
        portfolio_locks: PortfolioLocks::new(),
    }))
}
