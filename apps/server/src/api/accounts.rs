use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use ledgerfolio_core::{accounts::Account, accounts::NewAccount, holdings::Holding};
use serde::Serialize;
use tracing::info;

use crate::{error::ApiResult, main_lib::AppState};

async fn list_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Account>>> {
    let accounts = state.account_service.list_accounts()?;
    Ok(Json(accounts))
}

async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAccount>,
) -> ApiResult<Json<Account>> {
    let created = state.account_service.create_account(payload).await?;
    info!("Created account {} in portfolio {}", created.id, created.portfolio_id);
    Ok(Json(created))
}

async fn get_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Account>> {
    Ok(Json(state.account_service.get_account(&id)?))
}

async fn list_holdings(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Holding>>> {
    state.account_service.get_account(&id)?;
    Ok(Json(state.holdings_service.list_holdings(&id)?))
}

async fn recompute_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Holding>>> {
    let account = state.account_service.get_account(&id)?;
    let _guard = state.portfolio_locks.lock(&account.portfolio_id).await;
    let holdings = state.holdings_service.recompute_account(&id).await?;
    Ok(Json(holdings))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResponse {
    spurious_removed: usize,
    sold_out_removed: usize,
}

async fn cleanup_holdings(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CleanupResponse>> {
    let account = state.account_service.get_account(&id)?;
    let _guard = state.portfolio_locks.lock(&account.portfolio_id).await;
    let spurious_removed = state.holdings_service.cleanup_spurious_holdings(&id).await?;
    let sold_out_removed = state.holdings_service.purge_sold_out_holdings(&id).await?;
    Ok(Json(CleanupResponse {
        spurious_removed,
        sold_out_removed,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}/holdings", get(list_holdings))
        .route("/accounts/{id}/recompute", post(recompute_account))
        .route("/accounts/{id}/holdings/cleanup", post(cleanup_holdings))
}
