//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Datelike;
use http_body_util::BodyExt;
use tally_core::{config::Exchange, MockMarketData};
use tower::ServiceExt;

const RECEIPT_TEXT: &str = "CORNER MARKET\n2024-05-14\nBread 3.25\nSubtotal 3.25\nTotal: $42.50\n";

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.market.exchange = Exchange::Plain;
    config
}

fn test_state(ocr_text: Option<&str>) -> AppState {
    AppState::new(
        test_config(),
        ServerConfig::default(),
        Arc::new(MemoryLedger::new(Decimal::new(10_000, 0))),
        ocr_text.map(OcrClient::mock),
        Some(MarketDataClient::Mock(MockMarketData::synthetic())),
    )
}

fn setup_test_app() -> Router {
    create_router(test_state(Some(RECEIPT_TEXT)), None)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn multipart_request(uri: &str, field: &str, data: &[u8]) -> Request<Body> {
    let boundary = "tally-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"receipt.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app();
    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["ocr_backend"], "mock");
    assert_eq!(json["market_provider"], "mock");
    assert_eq!(json["pending_reviews"], 0);
}

// ========== Ledger ==========

#[tokio::test]
async fn test_balance_and_count_start_at_principal() {
    let app = setup_test_app();

    let json = get_body_json(get(&app, "/expenses/balance").await).await;
    assert_eq!(json["balance"], 10000.0);

    let json = get_body_json(get(&app, "/api/total-balance").await).await;
    assert_eq!(json["balance"], 10000.0);

    let json = get_body_json(get(&app, "/expenses/count").await).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_add_expense_updates_balance() {
    let app = setup_test_app();

    let response = post_json(&app, "/expenses/add", serde_json::json!({ "amount": 42.5 })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total"], 42.5);
    assert_eq!(json["balance"], 9957.5);
    assert_eq!(json["count"], 1);

    let json = get_body_json(get(&app, "/expenses/balance").await).await;
    assert_eq!(json["balance"], 9957.5);
}

#[tokio::test]
async fn test_add_non_positive_expense_rejected() {
    let app = setup_test_app();

    let response = post_json(&app, "/expenses/add", serde_json::json!({ "amount": 0 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Amount must be greater than 0");
}

// ========== Charts ==========

#[tokio::test]
async fn test_weekly_chart_shape() {
    let app = setup_test_app();
    let response = get(&app, "/expenses/weekly?month=3&year=2024&seed=7").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["week1"].as_array().unwrap().len(), 7);
    assert_eq!(json["week2"].as_array().unwrap().len(), 7);
    assert_eq!(json["comparison"].as_array().unwrap().len(), 7);
    assert_eq!(json["comparison"][0]["day"], "Mon");

    // Same seed, same chart
    let again = get_body_json(get(&app, "/expenses/weekly?month=3&year=2024&seed=7").await).await;
    assert_eq!(json, again);
}

#[tokio::test]
async fn test_sample_calendar_is_percentage_mode() {
    let app = setup_test_app();
    let response = get(&app, "/calendar/month?month=2&year=2024&seed=3").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "percentage");
    let days = json["days"].as_array().unwrap();
    assert_eq!(days.len(), 29);
    for day in days {
        let sum = day["expense"].as_f64().unwrap() + day["income"].as_f64().unwrap();
        assert!((sum - 100.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_ledger_calendar_uses_recorded_expenses() {
    let app = setup_test_app();
    post_json(
        &app,
        "/expenses/add",
        serde_json::json!({ "amount": 25, "date": "2024-05-14" }),
    )
    .await;

    let json = get_body_json(get(&app, "/calendar/month?month=5&year=2024&source=ledger").await).await;
    assert_eq!(json["mode"], "amount");
    assert_eq!(json["days"][13]["day"], 14);
    assert_eq!(json["days"][13]["expense"], 25.0);
    assert_eq!(json["days"][13]["income"], 0.0);
}

#[tokio::test]
async fn test_zero_month_means_current_month() {
    let app = setup_test_app();
    let json = get_body_json(get(&app, "/calendar/month?month=0&year=0&seed=3").await).await;

    let today = chrono::Utc::now().date_naive();
    assert_eq!(json["month"], today.month());
    assert_eq!(json["year"], today.year());
}

#[tokio::test]
async fn test_invalid_month_rejected() {
    let app = setup_test_app();
    let response = get(&app, "/calendar/month?month=13&year=2024").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_random_expenses() {
    let app = setup_test_app();
    let json = get_body_json(get(&app, "/expenses/random?month=1&year=2024&seed=9").await).await;
    for expense in json.as_array().unwrap() {
        let amount = expense["amount"].as_f64().unwrap();
        assert!((50.0..=800.0).contains(&amount));
        assert!(expense["date"].as_str().unwrap().starts_with("2024-01-"));
    }
}

// ========== OCR ==========

#[tokio::test]
async fn test_receipt_upload_records_expense() {
    let app = setup_test_app();
    let response = app
        .clone()
        .oneshot(multipart_request("/ocr/receipt", "file", b"\x89PNG fake"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["text"], RECEIPT_TEXT);
    assert_eq!(json["parsed"]["amount"], 42.5);
    assert_eq!(json["parsed"]["date"], "2024-05-14");
    assert_eq!(json["balance"], 9957.5);
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn test_unparseable_receipt_held_for_review() {
    let app = create_router(test_state(Some("smudged thermal paper")), None);
    let response = app
        .clone()
        .oneshot(multipart_request("/ocr/receipt", "file", b"image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["parsed"]["error"], "no total amount found in receipt text");
    let hash = json["parsed"]["review_hash"].as_str().unwrap().to_string();

    let list = get_body_json(get(&app, "/ocr/review").await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let item = get(&app, &format!("/ocr/review/{}", hash)).await;
    assert_eq!(item.status(), StatusCode::OK);
    assert_eq!(get_body_json(item).await["text"], "smudged thermal paper");

    let missing = get(&app, "/ocr/review/deadbeef").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_zero_total_receipt_held_for_review() {
    let text = "SHOP\nFree sample 0.00\nTOTAL 0.00";
    let app = create_router(test_state(Some(text)), None);
    let response = app
        .clone()
        .oneshot(multipart_request("/ocr/receipt", "file", b"image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["balance"], 10000.0);
    assert_eq!(json["parsed"]["error"], "no total amount found in receipt text");
    assert!(json["parsed"]["review_hash"].is_string());

    let list = get_body_json(get(&app, "/ocr/review").await).await;
    assert_eq!(list[0]["text"], text);
}

#[tokio::test]
async fn test_receipt_upload_requires_file_field() {
    let app = setup_test_app();
    let response = app
        .oneshot(multipart_request("/ocr/receipt", "image", b"data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_receipt_upload_without_engine() {
    let app = create_router(test_state(None), None);
    let response = app
        .oneshot(multipart_request("/ocr/receipt", "file", b"data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ========== Investments ==========

#[tokio::test]
async fn test_recommendations_split_balance() {
    let app = setup_test_app();
    let response = get(&app, "/investments/recommend").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["balance"], 10000.0);
    assert!(json["errors"].as_array().unwrap().is_empty());

    let recs = json["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 4);
    assert_eq!(recs[0]["symbol"], "AAPL");
    for rec in recs {
        let price = rec["price"].as_f64().unwrap();
        let shares = rec["shares"].as_u64().unwrap();
        assert!(price > 0.0);
        assert!(shares as f64 * price <= 2500.0 + price * 0.01);
    }
}

#[tokio::test]
async fn test_recommendations_default_config_uses_bare_tickers() {
    let state = AppState::new(
        AppConfig::default(),
        ServerConfig::default(),
        Arc::new(MemoryLedger::new(Decimal::new(10_000, 0))),
        None,
        Some(MarketDataClient::Mock(MockMarketData::synthetic())),
    );
    let app = create_router(state, None);

    let json = get_body_json(get(&app, "/investments/recommend").await).await;
    let symbols: Vec<&str> = json["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT", "GOOGL", "AMZN"]);
}

#[tokio::test]
async fn test_recommendations_without_provider() {
    let state = AppState::new(
        test_config(),
        ServerConfig::default(),
        Arc::new(MemoryLedger::new(Decimal::new(10_000, 0))),
        None,
        None,
    );
    let app = create_router(state, None);
    let response = get(&app, "/investments/recommend").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ========== State ==========

#[tokio::test]
async fn test_state_from_config_uses_csv_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.ledger.path = Some(dir.path().join("expenses.csv"));

    let state = AppState::from_config(config.clone(), ServerConfig::default()).unwrap();
    state.ledger.add_expense(Decimal::new(1000, 2), None).unwrap();

    let reopened = AppState::from_config(config, ServerConfig::default()).unwrap();
    let snapshot = reopened.ledger.snapshot().unwrap();
    assert_eq!(snapshot.count, 1);
    assert_eq!(snapshot.balance, Decimal::new(999_000, 2));
}
