use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use ledgerfolio_core::{
    holdings::{Holding, HoldingPosition},
    tax_lots::TaxLot,
};

use crate::{error::ApiResult, main_lib::AppState};

async fn get_holding(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Holding>> {
    Ok(Json(state.holdings_service.get_holding(&id)?))
}

async fn recompute_holding(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<HoldingPosition>> {
    let holding = state.holdings_service.get_holding(&id)?;
    let account = state.account_service.get_account(&holding.account_id)?;
    let _guard = state.portfolio_locks.lock(&account.portfolio_id).await;
    let position = state.holdings_service.recompute_holding(&id).await?;
    Ok(Json(position))
}

async fn list_tax_lots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TaxLot>>> {
    state.holdings_service.get_holding(&id)?;
    Ok(Json(state.tax_lot_service.list_lots(&id)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/holdings/{id}", get(get_holding))
        .route("/holdings/{id}/recompute", post(recompute_holding))
        .route("/holdings/{id}/tax-lots", get(list_tax_lots))
}
