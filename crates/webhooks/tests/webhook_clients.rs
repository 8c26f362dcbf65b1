use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use lightquote_core::config::WebhookConfig;
use lightquote_core::{Product, QuoteSubmission, WorkflowState};
use lightquote_webhooks::{
    DocumentUpload, ExtractionClient, ExtractionService, RetryPolicy, SubmissionClient,
    SubmissionSink, WebhookError,
};
use secrecy::SecretString;
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
struct RecordedField {
    name: String,
    file_name: Option<String>,
    text: String,
}

#[derive(Clone, Default)]
struct Recorder {
    hits: Arc<AtomicUsize>,
    fields: Arc<Mutex<Vec<RecordedField>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let address = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{address}")
}

fn webhook(url: String) -> WebhookConfig {
    WebhookConfig { url: Some(SecretString::from(url)), timeout_secs: 5 }
}

fn one_retry() -> RetryPolicy {
    RetryPolicy { max_retries: 1, backoff: Duration::ZERO }
}

fn sample_submission() -> QuoteSubmission {
    let state = WorkflowState {
        products: vec![Product::manual_entry()],
        original_extraction_response: Some(json!({"products": []})),
        ..WorkflowState::default()
    };
    QuoteSubmission::from_state(&state, Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap())
}

async fn record_upload(State(recorder): State<Recorder>, mut multipart: Multipart) -> Json<Value> {
    recorder.hits.fetch_add(1, Ordering::SeqCst);
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.expect("field bytes");
        fields.push(RecordedField {
            name,
            file_name,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    recorder.fields.lock().expect("fields lock").extend(fields);

    Json(json!({"products": [{"brand_name": "Lumenpulse", "sku": "LP-100"}]}))
}

async fn unavailable_then_ok(State(recorder): State<Recorder>) -> Response {
    if recorder.hits.fetch_add(1, Ordering::SeqCst) == 0 {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        Json(json!([{"message": {"content": {"Products": []}}}])).into_response()
    }
}

async fn record_submission(State(recorder): State<Recorder>, Json(body): Json<Value>) -> StatusCode {
    recorder.hits.fetch_add(1, Ordering::SeqCst);
    recorder.bodies.lock().expect("bodies lock").push(body);
    StatusCode::OK
}

async fn reject_submission(State(recorder): State<Recorder>) -> StatusCode {
    recorder.hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::UNPROCESSABLE_ENTITY
}

#[tokio::test]
async fn extraction_posts_multipart_fields_and_returns_raw_json() {
    let recorder = Recorder::default();
    let base =
        serve(Router::new().route("/extract", post(record_upload)).with_state(recorder.clone()))
            .await;
    let client =
        ExtractionClient::new(reqwest::Client::new(), &webhook(format!("{base}/extract")), one_retry());

    let delivery = client
        .extract(&DocumentUpload::new("schedule.pdf", b"%PDF-1.7".to_vec()))
        .await
        .expect("extraction succeeds");

    assert_eq!(delivery.attempts, 1);
    assert_eq!(delivery.value["products"][0]["sku"], "LP-100");

    let fields = recorder.fields.lock().expect("fields lock").clone();
    let field = |name: &str| fields.iter().find(|field| field.name == name).cloned();
    let file = field("file").expect("file part");
    assert_eq!(file.file_name.as_deref(), Some("schedule.pdf"));
    assert_eq!(file.text, "%PDF-1.7");
    assert_eq!(field("fileName").map(|field| field.text).as_deref(), Some("schedule.pdf"));
    assert_eq!(field("fileSize").map(|field| field.text).as_deref(), Some("8"));
    assert_eq!(field("fileType").map(|field| field.text).as_deref(), Some("application/pdf"));
}

#[tokio::test]
async fn extraction_retries_once_after_server_error() {
    let recorder = Recorder::default();
    let base = serve(
        Router::new().route("/extract", post(unavailable_then_ok)).with_state(recorder.clone()),
    )
    .await;
    let client =
        ExtractionClient::new(reqwest::Client::new(), &webhook(format!("{base}/extract")), one_retry());

    let delivery = client
        .extract(&DocumentUpload::new("schedule.pdf", Vec::new()))
        .await
        .expect("second attempt succeeds");

    assert_eq!(delivery.attempts, 2);
    assert_eq!(recorder.hits.load(Ordering::SeqCst), 2);
    assert!(delivery.value.is_array());
}

#[tokio::test]
async fn submission_posts_wire_shaped_json() {
    let recorder = Recorder::default();
    let base = serve(
        Router::new().route("/submit", post(record_submission)).with_state(recorder.clone()),
    )
    .await;
    let client =
        SubmissionClient::new(reqwest::Client::new(), &webhook(format!("{base}/submit")), one_retry());

    let delivery = client.submit(&sample_submission()).await.expect("submission accepted");

    assert_eq!(delivery.attempts, 1);
    let bodies = recorder.bodies.lock().expect("bodies lock").clone();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["n8nResponse"], json!({"products": []}));
    assert_eq!(body["products"][0]["id"], "text-input-1");
    assert_eq!(body["products"][0]["type"], "Custom Product");
    assert!(body.get("clientInfo").is_some());
    assert!(body.get("deadline").is_some());
    assert!(body["submittedAt"].as_str().is_some_and(|at| at.starts_with("2026-10-18T12:00:00")));
}

#[tokio::test]
async fn submission_client_errors_are_not_retried() {
    let recorder = Recorder::default();
    let base = serve(
        Router::new().route("/submit", post(reject_submission)).with_state(recorder.clone()),
    )
    .await;
    let client =
        SubmissionClient::new(reqwest::Client::new(), &webhook(format!("{base}/submit")), one_retry());

    let failure = client.submit(&sample_submission()).await.expect_err("rejected");

    assert_eq!(failure.attempts, 1);
    assert_eq!(recorder.hits.load(Ordering::SeqCst), 1);
    assert!(matches!(failure.error, WebhookError::Status { status: 422, .. }));
}

#[tokio::test]
async fn unreachable_webhook_is_retried_then_reported() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let address = listener.local_addr().expect("listener address");
    drop(listener);

    let client = SubmissionClient::new(
        reqwest::Client::new(),
        &webhook(format!("http://{address}/submit")),
        one_retry(),
    );

    let failure = client.submit(&sample_submission()).await.expect_err("nothing is listening");

    assert_eq!(failure.attempts, 2);
    assert!(matches!(failure.error, WebhookError::Transport { .. }));
}

#[tokio::test]
async fn unconfigured_webhook_fails_before_sending() {
    let client = ExtractionClient::new(
        reqwest::Client::new(),
        &WebhookConfig { url: None, timeout_secs: 5 },
        one_retry(),
    );

    let failure = client
        .extract(&DocumentUpload::new("schedule.pdf", Vec::new()))
        .await
        .expect_err("no url configured");

    assert_eq!(failure.attempts, 0);
    assert!(matches!(failure.error, WebhookError::NotConfigured { webhook: "extraction" }));
}
