use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use ledgerfolio_core::{
    accounts::Account,
    tax_lots::{BackfillSummary, ConsistencyReport},
};
use tracing::info;

use crate::{error::ApiResult, main_lib::AppState};

async fn list_accounts(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(state.account_service.list_portfolio_accounts(&id)?))
}

async fn backfill_tax_lots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BackfillSummary>> {
    let _guard = state.portfolio_locks.lock(&id).await;
    let summary = state.tax_lot_service.backfill_portfolio(&id).await?;
    info!(
        "Backfilled portfolio {}: {} lots created, {} sales matched",
        id, summary.created, summary.consumed
    );
    Ok(Json(summary))
}

async fn rebuild_tax_lots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BackfillSummary>> {
    let _guard = state.portfolio_locks.lock(&id).await;
    let summary = state.tax_lot_service.rebuild_portfolio(&id).await?;
    Ok(Json(summary))
}

async fn check_consistency(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ConsistencyReport>> {
    Ok(Json(state.tax_lot_service.check_consistency(&id)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolios/{id}/accounts", get(list_accounts))
        .route("/portfolios/{id}/tax-lots/backfill", post(backfill_tax_lots))
        .route("/portfolios/{id}/tax-lots/rebuild", post(rebuild_tax_lots))
        .route("/portfolios/{id}/consistency", get(check_consistency))
}
