//! Statement imports running through the core services on a real SQLite file.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::tempdir;

use ledgerfolio_core::accounts::{AccountRepositoryTrait, NewAccount};
use ledgerfolio_core::holdings::{HoldingRepositoryTrait, HoldingsService, HoldingsServiceTrait};
use ledgerfolio_core::imports::{ImportOptions, ImportService, ImportServiceTrait, RowStatus};
use ledgerfolio_core::tax_lots::{TaxLotService, TaxLotServiceTrait};
use ledgerfolio_core::transactions::{TransactionKind, TransactionRepositoryTrait};
use ledgerfolio_storage_sqlite::accounts::AccountRepository;
use ledgerfolio_storage_sqlite::holdings::HoldingRepository;
use ledgerfolio_storage_sqlite::tax_lots::TaxLotRepository;
use ledgerfolio_storage_sqlite::transactions::TransactionRepository;
use ledgerfolio_storage_sqlite::{create_pool, init, run_migrations, spawn_writer};

const SCHWAB: &str = "\"Date\",\"Action\",\"Symbol\",\"Description\",\"Quantity\",\"Price\",\"Fees & Comm\",\"Amount\"
\"03/01/2024\",\"Buy\",\"AAPL\",\"APPLE INC\",\"10\",\"$170.00\",\"$1.00\",\"-$1,701.00\"
\"03/15/2024\",\"Qualified Dividend\",\"AAPL\",\"APPLE INC\",\"\",\"\",\"\",\"$2.40\"
\"03/20/2024\",\"Sell\",\"AAPL\",\"APPLE INC\",\"4\",\"$180.00\",\"$0.50\",\"$719.50\"
\"03/21/2024\",\"Journal\",\"\",\"JOURNAL TO ...123\",\"\",\"\",\"\",\"-$100.00\"
\"03/22/2024\",\"Reinvest Shares\",\"VTI\",\"VANGUARD TOTAL\",\"0.0123\",\"$250.00\",\"\",\"-$3.08\"
";

struct Ledger {
    transactions: Arc<TransactionRepository>,
    holdings: Arc<HoldingRepository>,
    holdings_service: Arc<HoldingsService>,
    tax_lots: Arc<TaxLotService>,
    imports: ImportService,
    _temp_dir: tempfile::TempDir,
}

async fn open_ledger() -> Ledger {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("nested").join("ledger.db");
    let db_path = init(&db_path.to_string_lossy()).expect("Failed to init database");

    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    let accounts = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let transactions = Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let holdings = Arc::new(HoldingRepository::new(pool.clone(), writer.clone()));
    let lots = Arc::new(TaxLotRepository::new(pool.clone(), writer.clone()));

    accounts
        .create(NewAccount {
            id: Some("acc-1".to_string()),
            portfolio_id: "pf-1".to_string(),
            name: "Brokerage".to_string(),
            account_type: "BROKERAGE".to_string(),
            currency: "USD".to_string(),
        })
        .await
        .expect("Failed to create account");

    let holdings_service = Arc::new(HoldingsService::new(
        holdings.clone(),
        transactions.clone(),
        lots.clone(),
    ));
    let tax_lots = Arc::new(TaxLotService::new(
        accounts.clone(),
        transactions.clone(),
        holdings.clone(),
        lots,
    ));
    let imports = ImportService::new(
        accounts,
        transactions.clone(),
        holdings_service.clone(),
        tax_lots.clone(),
    );

    Ledger {
        transactions,
        holdings,
        holdings_service,
        tax_lots,
        imports,
        _temp_dir: temp_dir,
    }
}

#[tokio::test]
async fn import_derives_holdings_lots_and_gains() {
    let ledger = open_ledger().await;

    let summary = ledger
        .imports
        .import_statement(SCHWAB, ImportOptions::for_account("acc-1"))
        .await
        .unwrap();
    assert_eq!(summary.imported, 5);
    assert_eq!(summary.errors, 0);

    let aapl = ledger
        .holdings
        .find_by_symbol("acc-1", "AAPL")
        .unwrap()
        .expect("AAPL holding");
    assert_eq!(aapl.quantity, dec!(6));

    let sell = ledger
        .transactions
        .list_by_account("acc-1")
        .unwrap()
        .into_iter()
        .find(|t| t.kind == TransactionKind::Sell)
        .expect("sale row");
    assert_eq!(sell.cost_basis_used, Some(dec!(680.4)));
    assert_eq!(sell.realized_gain_loss, Some(dec!(39.1)));
    assert_eq!(sell.lot_shortfall, Some(Decimal::ZERO));
    assert_eq!(sell.raw_fields.as_ref().map(|f| f["Action"].as_str()), Some("Sell"));

    let cash = ledger
        .holdings
        .find_by_symbol("acc-1", "CASH.USD")
        .unwrap()
        .expect("cash holding");
    // -1701 + 2.40 + 719.50 - 100; the reinvestment never touches cash.
    assert_eq!(cash.quantity, dec!(-1079.1));

    let report = ledger.tax_lots.check_consistency("pf-1").unwrap();
    assert!(report.is_consistent());
}

#[tokio::test]
async fn reimport_is_idempotent() {
    let ledger = open_ledger().await;
    let options = ImportOptions::for_account("acc-1");

    ledger.imports.import_statement(SCHWAB, options.clone()).await.unwrap();
    let second = ledger.imports.import_statement(SCHWAB, options).await.unwrap();

    assert_eq!(second.imported, 0);
    assert!(second.results.iter().all(|r| r.status == RowStatus::Skipped));
    assert_eq!(ledger.transactions.list_by_account("acc-1").unwrap().len(), 5);
}

#[tokio::test]
async fn rollback_restores_the_prior_state() {
    let ledger = open_ledger().await;
    let summary = ledger
        .imports
        .import_statement(SCHWAB, ImportOptions::for_account("acc-1"))
        .await
        .unwrap();

    let rollback = ledger.imports.rollback(&summary.batch_id).await.unwrap();
    assert_eq!(rollback.deleted, 5);
    assert!(ledger.transactions.list_by_account("acc-1").unwrap().is_empty());
    assert!(ledger
        .holdings_service
        .list_holdings("acc-1")
        .unwrap()
        .iter()
        .all(|h| h.quantity.is_zero()));

    // The same statement imports cleanly again.
    let again = ledger
        .imports
        .import_statement(SCHWAB, ImportOptions::for_account("acc-1"))
        .await
        .unwrap();
    assert_eq!(again.imported, 5);
}
