//! HTTP-level tests driving the router directly

use api::{config::Settings, create_router, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use storage::{Repository, Timestamp};
use tower::ServiceExt;

async fn setup(api_key: Option<&str>) -> (Router, Repository) {
    let repo = Repository::in_memory().await.unwrap();
    repo.ensure_schema().await.unwrap();

    let mut settings = Settings::default();
    settings.auth.api_key = api_key.map(String::from);

    let state = Arc::new(AppState::new(repo.clone(), &settings));
    (create_router(state), repo)
}

async fn seed(repo: &Repository, rows: &[(&str, f64, f64)]) {
    for (ts, height, flow) in rows {
        let ts = Timestamp::parse_canonical(ts).unwrap();
        repo.insert(*height, *flow, Some(ts)).await.unwrap();
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn post_form(app: &Router, uri: &str, form: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_live_readings_default_to_flow() {
    let (app, repo) = setup(None).await;
    seed(
        &repo,
        &[("2024-03-01 10:00:00", 2.0, 6.0), ("2024-03-01 10:00:10", 3.0, 7.5)],
    )
    .await;

    let (status, _, body) = get(&app, "/api/readings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        serde_json::json!([
            { "id": 2, "timestamp": "01/03/2024 10:00:10", "flow": 7.5 },
            { "id": 1, "timestamp": "01/03/2024 10:00:00", "flow": 6.0 }
        ])
    );
}

#[tokio::test]
async fn test_height_projection_with_day_filter() {
    let (app, repo) = setup(None).await;
    seed(
        &repo,
        &[("2024-03-01 10:00:00", 2.0, 6.0), ("2024-03-02 10:00:00", 3.0, 7.0)],
    )
    .await;

    let (status, _, body) = get(&app, "/api/readings?filter=day&date=2024-03-02&type=height").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        serde_json::json!([{ "id": 2, "timestamp": "02/03/2024 10:00:00", "height": 3.0 }])
    );
}

#[tokio::test]
async fn test_minute_filter_over_http() {
    let (app, repo) = setup(None).await;
    seed(
        &repo,
        &[
            ("2024-05-10 14:30:02", 1.0, 5.0),
            ("2024-03-01 14:30:45", 1.0, 5.0),
            ("2024-03-01 14:31:00", 1.0, 5.0),
        ],
    )
    .await;

    let (status, _, body) = get(&app, "/api/readings?filter=minute&minute=14:30").await;
    assert_eq!(status, StatusCode::OK);
    let stamps: Vec<String> = json(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["timestamp"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(stamps, vec!["01/03/2024 14:30:45", "10/05/2024 14:30:02"]);
}

#[tokio::test]
async fn test_download_csv() {
    let (app, repo) = setup(None).await;
    seed(
        &repo,
        &[
            ("2024-03-01 00:00:01", 1.5, 5.5),
            ("2024-03-01 12:00:00", 2.5, 6.5),
            ("2024-03-01 23:59:59", 3.5, 7.5),
            ("2024-03-02 00:00:00", 4.5, 8.5),
        ],
    )
    .await;

    let (status, headers, body) = get(&app, "/download?date=2024-03-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=data_2024-03-01.csv"
    );
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let csv = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "ID,Date,Time,Height (m),Flow (m³/s)");
    assert_eq!(lines[1], "3,01/03/2024,23:59:59,3.5,7.5");
    assert_eq!(lines[3], "1,01/03/2024,00:00:01,1.5,5.5");
}

#[tokio::test]
async fn test_download_requires_date() {
    let (app, _) = setup(None).await;

    let (status, _, body) = get(&app, "/download").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].is_string());

    let (status, _, _) = get(&app, "/download?date=01-03-2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejected_query_string_is_json_error() {
    let (app, _) = setup(None).await;

    let (status, headers, body) = get(&app, "/api/readings?filter=day&filter=all").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert!(json(&body)["error"].is_string());

    let (status, _, body) = get(&app, "/download?date=2024-03-01&date=2024-03-02").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].is_string());
}

#[tokio::test]
async fn test_receive_inserts_then_reports_duplicate() {
    let (app, repo) = setup(None).await;

    let (status, body) = post_form(
        &app,
        "/receive",
        "height=2.5&flow=7.25&timestamp=2024-03-01T14%3A30",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "inserted", "id": 1 }));

    let (status, body) = post_form(
        &app,
        "/receive",
        "height=9&flow=9&timestamp=2024-03-01+14%3A30%3A00",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "duplicate" }));
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_receive_missing_flow_is_rejected() {
    let (app, repo) = setup(None).await;

    let (status, body) = post_form(&app, "/receive", "height=2.5&timestamp=2024-03-01T14%3A30").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: flow");
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_api_key_guards_data_routes() {
    let (app, _) = setup(Some("s3cret")).await;

    let (status, _, _) = get(&app, "/api/readings").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/readings?filter=all")
        .header("X-API-Key", "s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_count() {
    let (app, repo) = setup(None).await;
    seed(&repo, &[("2024-03-01 10:00:00", 2.0, 6.0)]).await;

    let (status, _, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["reading_count"], 1);
}

#[tokio::test]
async fn test_metrics_absent_without_recorder() {
    let (app, _) = setup(None).await;
    let (status, _, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
