use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use ledgerfolio_server::{api::app_router, build_state, config::Config};

const SCHWAB: &str = "\"Date\",\"Action\",\"Symbol\",\"Description\",\"Quantity\",\"Price\",\"Fees & Comm\",\"Amount\"
\"03/01/2024\",\"Buy\",\"AAPL\",\"APPLE INC\",\"10\",\"$170.00\",\"$1.00\",\"-$1,701.00\"
\"03/20/2024\",\"Sell\",\"AAPL\",\"APPLE INC\",\"4\",\"$180.00\",\"$0.50\",\"$719.50\"
";

async fn build_test_router() -> (Router, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config {
        db_path: tmp.path().join("test.db").to_string_lossy().to_string(),
        ..Config::default()
    };
    let state = build_state(&config).await.unwrap();
    (app_router(state, &config).unwrap(), tmp)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    (status, value)
}

async fn create_account(app: &Router) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/accounts",
        Some(json!({
            "id": "acc-1",
            "portfolioId": "pf-1",
            "name": "Brokerage",
            "currency": "USD"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn healthz_responds() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn invalid_account_is_a_bad_request() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/accounts",
        Some(json!({ "portfolioId": "pf-1", "name": "", "currency": "USD" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn import_then_inspect_lots_and_rollback() {
    let (app, _tmp) = build_test_router().await;
    create_account(&app).await;

    let (status, summary) = send(
        &app,
        Method::POST,
        "/api/v1/imports",
        Some(json!({ "text": SCHWAB, "options": { "accountId": "acc-1" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    assert_eq!(summary["format"], "schwab");
    assert_eq!(summary["imported"], 2);

    let (_, holdings) = send(&app, Method::GET, "/api/v1/accounts/acc-1/holdings", None).await;
    let aapl = holdings
        .as_array()
        .unwrap()
        .iter()
        .find(|h| h["symbol"] == "AAPL")
        .cloned()
        .unwrap();
    assert_eq!(aapl["quantity"], 6.0);

    let lots_uri = format!("/api/v1/holdings/{}/tax-lots", aapl["id"].as_str().unwrap());
    let (status, lots) = send(&app, Method::GET, &lots_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lots.as_array().unwrap().len(), 1);
    assert_eq!(lots[0]["remainingQuantity"], 6.0);

    let (status, report) = send(&app, Method::GET, "/api/v1/portfolios/pf-1/consistency", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["shortfalls"].as_array().unwrap().len(), 0);

    let rollback_uri = format!("/api/v1/imports/{}", summary["batchId"].as_str().unwrap());
    let (status, rollback) = send(&app, Method::DELETE, &rollback_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rollback["deleted"], 2);

    let (status, again) = send(&app, Method::DELETE, &rollback_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["deleted"], 0);
}

#[tokio::test]
async fn rollback_of_reimport_returns_zero_deleted() {
    let (app, _tmp) = build_test_router().await;
    create_account(&app).await;
    let body = json!({ "text": SCHWAB, "options": { "accountId": "acc-1" } });

    send(&app, Method::POST, "/api/v1/imports", Some(body.clone())).await;
    let (_, second) = send(&app, Method::POST, "/api/v1/imports", Some(body)).await;
    assert_eq!(second["imported"], 0);

    let uri = format!("/api/v1/imports/{}", second["batchId"].as_str().unwrap());
    let (status, rollback) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rollback["deleted"], 0);

    let (_, holdings) = send(&app, Method::GET, "/api/v1/accounts/acc-1/holdings", None).await;
    let aapl = holdings
        .as_array()
        .unwrap()
        .iter()
        .find(|h| h["symbol"] == "AAPL")
        .cloned()
        .unwrap();
    assert_eq!(aapl["quantity"], 6.0);
}

#[tokio::test]
async fn unrecognized_statement_is_unprocessable() {
    let (app, _tmp) = build_test_router().await;
    create_account(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/imports",
        Some(json!({ "text": "foo,bar\n1,2\n", "options": { "accountId": "acc-1" } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let (app, _tmp) = build_test_router().await;
    let (status, _) = send(&app, Method::POST, "/api/v1/accounts/nope/recompute", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detect_and_templates() {
    let (app, _tmp) = build_test_router().await;
    let (status, detected) = send(
        &app,
        Method::POST,
        "/api/v1/imports/detect",
        Some(json!({ "text": SCHWAB })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detected["format"], "schwab");

    let (_, templates) = send(&app, Method::GET, "/api/v1/imports/templates", None).await;
    assert!(templates
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["format"] == "generic"));
}

#[tokio::test]
async fn raw_upload_uses_query_options() {
    let (app, _tmp) = build_test_router().await;
    create_account(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/imports/upload?accountId=acc-1&dryRun=true")
        .body(Body::from(SCHWAB.as_bytes().to_vec()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let summary: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(summary["wouldImport"], 2);
    assert_eq!(summary["imported"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lot_passes_do_not_double_consume() {
    let (app, _tmp) = build_test_router().await;
    create_account(&app).await;
    let statement = "Date,Type,Symbol,Description,Quantity,Price,Fees,Amount,Currency
2024-01-02,BUY,MSFT,Microsoft,10,400,,,USD
2024-01-09,SELL,MSFT,Microsoft,2,410,,,USD
";
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/imports",
        Some(json!({ "text": statement, "options": { "accountId": "acc-1" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut tasks = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        let uri = if i % 2 == 0 {
            "/api/v1/portfolios/pf-1/tax-lots/rebuild"
        } else {
            "/api/v1/portfolios/pf-1/tax-lots/backfill"
        };
        tasks.push(tokio::spawn(async move {
            send(&app, Method::POST, uri, None).await
        }));
    }
    for task in tasks {
        let (status, summary) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["errors"].as_array().unwrap().len(), 0, "{}", summary);
    }

    let (_, holdings) = send(&app, Method::GET, "/api/v1/accounts/acc-1/holdings", None).await;
    let msft = holdings
        .as_array()
        .unwrap()
        .iter()
        .find(|h| h["symbol"] == "MSFT")
        .cloned()
        .unwrap();
    let lots_uri = format!("/api/v1/holdings/{}/tax-lots", msft["id"].as_str().unwrap());
    let (_, lots) = send(&app, Method::GET, &lots_uri, None).await;
    assert_eq!(lots.as_array().unwrap().len(), 1);
    assert_eq!(lots[0]["remainingQuantity"], 8.0);

    let (_, report) = send(&app, Method::GET, "/api/v1/portfolios/pf-1/consistency", None).await;
    assert_eq!(report["shortfalls"].as_array().unwrap().len(), 0);
    assert!(report["holdings"]
        .as_array()
        .unwrap()
        .iter()
        .all(|h| h["quantityMatches"] == true));
}
