//! # HTTP API Tests
//!
//! Drives the axum router against an in-memory printer.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use termica::flow::ManualClock;
use termica::printer::{PrinterSettings, ThermalPrinter};
use termica::server::{AppState, app};
use termica::transport::MemoryTransport;
use termica::usage::MemoryStore;
use tower::ServiceExt; // for .oneshot()

fn test_app(settings: PrinterSettings) -> (Router, MemoryTransport) {
    let transport = MemoryTransport::with_paper();
    let printer = ThermalPrinter::new(
        Box::new(transport.clone()),
        None,
        Box::new(MemoryStore::new()),
        Arc::new(ManualClock::new()),
        &settings,
    );
    (app(Arc::new(AppState::new(printer))), transport)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_print_text() {
    let (app, transport) = test_app(PrinterSettings::default());
    let (status, body) = call(&app, "POST", "/api/print/text", Some(json!({"text": "Hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(transport.sent_contains(b"Hello\n"));
}

#[tokio::test]
async fn test_paper_out_is_conflict() {
    let (app, transport) = test_app(PrinterSettings::default());
    transport.set_paper(false);
    let (status, body) = call(&app, "POST", "/api/print/text", Some(json!({"text": "Hi"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "PAPER_OUT");
}

#[tokio::test]
async fn test_two_column_dots() {
    let (app, transport) = test_app(PrinterSettings::default());
    let (status, _) = call(
        &app,
        "POST",
        "/api/print/two-column",
        Some(json!({"left": "Coffee", "right": "$3.50", "fill_dots": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let line = format!("Coffee{}$3.50\n", ".".repeat(21));
    assert!(transport.sent_contains(line.as_bytes()));
}

#[tokio::test]
async fn test_invalid_barcode_is_bad_request() {
    let (app, _) = test_app(PrinterSettings::default());
    let (status, body) = call(
        &app,
        "POST",
        "/api/print/barcode",
        Some(json!({"barcode_type": "ean13", "data": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn test_queue_lifecycle() {
    let settings = PrinterSettings {
        queue_capacity: 2,
        ..Default::default()
    };
    let (app, transport) = test_app(settings);

    let job = json!({"kind": "text", "text": "Order 12", "size": "large", "priority": 3});
    let (status, body) = call(&app, "POST", "/api/jobs", Some(job.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queued"], 1);
    assert!(body["id"].is_string());

    call(&app, "POST", "/api/jobs", Some(json!({"kind": "separator"}))).await;
    let (status, body) = call(&app, "POST", "/api/jobs", Some(job)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "QUEUE_FULL");

    let (_, body) = call(&app, "GET", "/api/jobs", None).await;
    assert_eq!(body["length"], 2);
    assert_eq!(body["jobs"][0]["kind"], "text");
    assert_eq!(body["jobs"][0]["priority"], 3);

    let (status, body) = call(&app, "POST", "/api/jobs/flush", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["drained"], true);
    assert!(transport.sent_contains(b"Order 12\n"));

    let (_, body) = call(&app, "GET", "/api/status", None).await;
    assert_eq!(body["status"]["queue"]["length"], 0);
    assert_eq!(body["status"]["queue"]["processed"], 2);
    assert_eq!(body["status"]["queue"]["dropped"], 1);
}

#[tokio::test]
async fn test_clear_queue() {
    let (app, _) = test_app(PrinterSettings::default());
    call(&app, "POST", "/api/jobs", Some(json!({"kind": "feed", "lines": 2}))).await;
    let (_, body) = call(&app, "DELETE", "/api/jobs", None).await;
    assert_eq!(body["removed"], 1);
}

#[tokio::test]
async fn test_queue_settings() {
    let (app, _) = test_app(PrinterSettings::default());
    let (status, body) = call(
        &app,
        "PUT",
        "/api/queue/settings",
        Some(json!({"capacity": 4, "inter_job_delay_ms": 500, "auto_process": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue"]["capacity"], 4);
    assert_eq!(body["queue"]["inter_job_delay_ms"], 500);
    assert_eq!(body["queue"]["auto_process"], false);
}

#[tokio::test]
async fn test_usage_endpoints() {
    let (app, _) = test_app(PrinterSettings::default());
    call(&app, "POST", "/api/feed", Some(json!({"lines": 5}))).await;

    let (_, body) = call(&app, "GET", "/api/usage", None).await;
    assert_eq!(body["usage"]["feeds"], 5);
    assert_eq!(body["usage"]["usage_mm"], 20.0);

    let (status, body) = call(
        &app,
        "PUT",
        "/api/usage/calibration",
        Some(json!({"roll_length_mm": 10000.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["roll_length_mm"], 10000.0);

    let (status, _) = call(
        &app,
        "PUT",
        "/api/usage/calibration",
        Some(json!({"line_height_mm": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, "POST", "/api/usage/reset", None).await;
    assert_eq!(body["usage"]["usage_mm"], 0.0);
}

#[tokio::test]
async fn test_predict_usage() {
    let (app, _) = test_app(PrinterSettings::default());
    let (_, body) = call(
        &app,
        "POST",
        "/api/usage/predict",
        Some(json!({"text": "one\ntwo", "size": "large"})),
    )
    .await;
    assert_eq!(body["predicted_mm"], 16.0);
    assert_eq!(body["fits"], true);
}

#[tokio::test]
async fn test_detailed_status_without_handshake() {
    let (app, _) = test_app(PrinterSettings::default());
    let (status, body) = call(&app, "GET", "/api/status/detailed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["paper_present"], true);
    assert_eq!(body["status"]["online"], true);
    assert_eq!(body["status"]["cover_open"], false);
}

#[tokio::test]
async fn test_print_bitmap() {
    let (app, transport) = test_app(PrinterSettings::default());
    let (status, _) = call(
        &app,
        "POST",
        "/api/print/bitmap",
        Some(json!({"width": 16, "height": 2, "data": [255, 0, 0, 255]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(transport.sent_contains(&[0x1D, b'v', b'0', 0, 2, 0, 2, 0, 0xFF, 0, 0, 0xFF]));

    let (status, body) = call(
        &app,
        "POST",
        "/api/print/bitmap",
        Some(json!({"width": 16, "height": 2, "data": [255]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn test_style_and_beep() {
    let (app, transport) = test_app(PrinterSettings::default());
    let (status, _) = call(
        &app,
        "PUT",
        "/api/style",
        Some(json!({"double_strike": true, "tab_stops": [10, 20]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(transport.sent_contains(&[0x1B, b'G', 1, 0x1B, b'D', 10, 20, 0]));
    assert!(!transport.sent_contains(&[0x1B, b'{']));

    let (status, _) = call(&app, "POST", "/api/beep", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(transport.sent_contains(&[0x1B, b'B', 3, 3]));
}
