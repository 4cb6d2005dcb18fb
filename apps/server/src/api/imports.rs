use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use ledgerfolio_core::{
    imports::{ImportOptions, ImportSummary, RollbackSummary},
    statements::{ImportTemplate, StatementFormat},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Vec<ImportTemplate>> {
    Json(state.import_service.templates())
}

#[derive(Deserialize)]
struct DetectRequest {
    text: String,
}

#[derive(Serialize)]
struct DetectResponse {
    format: Option<StatementFormat>,
}

async fn detect_format(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DetectRequest>,
) -> Json<DetectResponse> {
    Json(DetectResponse {
        format: state.import_service.detect_format(&payload.text),
    })
}

#[derive(Deserialize)]
struct ImportRequest {
    text: String,
    options: ImportOptions,
}

async fn import_statement(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportRequest>,
) -> ApiResult<Json<ImportSummary>> {
    let account = state.account_service.get_account(&payload.options.account_id)?;
    let _guard = state.portfolio_locks.lock(&account.portfolio_id).await;
    let summary = state
        .import_service
        .import_statement(&payload.text, payload.options)
        .await?;
    info!(
        "Import {} ({}): {} imported, {} skipped, {} errors",
        summary.batch_id,
        summary.format.as_str(),
        summary.imported,
        summary.skipped,
        summary.errors
    );
    Ok(Json(summary))
}

/// Raw export upload; options travel in the query string.
async fn upload_statement(
    State(state): State<Arc<AppState>>,
    Query(options): Query<ImportOptions>,
    body: Bytes,
) -> ApiResult<Json<ImportSummary>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Request body is empty".to_string()));
    }
    let account = state.account_service.get_account(&options.account_id)?;
    let _guard = state.portfolio_locks.lock(&account.portfolio_id).await;
    let summary = state.import_service.import_bytes(&body, options).await?;
    Ok(Json(summary))
}

async fn rollback_import(
    Path(batch_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RollbackSummary>> {
    let portfolios = state
        .import_service
        .batch_accounts(&batch_id)?
        .into_iter()
        .map(|a| a.portfolio_id);
    let _guard = state.portfolio_locks.lock_all(portfolios).await;
    let summary = state.import_service.rollback(&batch_id).await?;
    info!("Rolled back import {}: {} rows deleted", batch_id, summary.deleted);
    Ok(Json(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/imports/templates", get(list_templates))
        .route("/imports/detect", post(detect_format))
        .route("/imports", post(import_statement))
        .route("/imports/upload", post(upload_statement))
        .route("/imports/{batch_id}", delete(rollback_import))
}
