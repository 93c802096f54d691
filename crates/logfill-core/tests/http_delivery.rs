//! End-to-end delivery against an in-process HTTP destination.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    routing::{get, post},
};
use chrono::Utc;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use logfill_core::{
    BackfillConfig, BackfillCoordinator, DeliveryError, DeliverySink, Event, GeneratorConfig,
    HttpSink, ReadinessError, wait_for_ready,
};

#[derive(Clone, Default)]
struct Received {
    docs: Arc<Mutex<Vec<(Option<String>, Bytes)>>>,
}

async fn index_doc(State(received): State<Received>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    received.docs.lock().unwrap().push((content_type, body));
    StatusCode::CREATED
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

/// Serve a fake index on an ephemeral port and return its base URL.
async fn spawn_destination(received: Received) -> String {
    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/test/_doc/", post(index_doc))
        .route("/down/_doc/", post(unavailable))
        .route("/down/", get(unavailable))
        .with_state(received);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_backfill_over_http() {
    let received = Received::default();
    let base_url = spawn_destination(received.clone()).await;

    let config = GeneratorConfig {
        base_url: base_url.clone(),
        horizon: Duration::from_secs(20 * 60),
        ..GeneratorConfig::default()
    };
    config.validate().unwrap();

    let sink = Arc::new(HttpSink::new(config.doc_url(), config.request_timeout).unwrap());
    let report = BackfillCoordinator::new(sink, config.backfill_config())
        .run(Utc::now(), CancellationToken::new())
        .await;

    assert!(report.events.generated > 0);
    assert_eq!(report.events.delivered, report.events.generated);
    assert_eq!(report.events.failed, 0);

    let docs = received.docs.lock().unwrap();
    assert_eq!(docs.len() as u64, report.events.delivered);
    for (content_type, body) in docs.iter() {
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let event: Event = serde_json::from_slice(body).unwrap();
        assert!(!event.message.is_empty());
    }
}

#[tokio::test]
async fn test_non_success_status_is_a_delivery_error() {
    let base_url = spawn_destination(Received::default()).await;
    let sink = HttpSink::new(format!("{base_url}down/_doc/"), Duration::from_secs(5)).unwrap();

    let err = sink
        .deliver(Bytes::from_static(b"{\"level\":\"INFO\"}"))
        .await
        .unwrap_err();
    match err {
        DeliveryError::Status { status } => assert_eq!(status.as_u16(), 503),
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_backfill_against_failing_destination_completes() {
    let base_url = spawn_destination(Received::default()).await;
    let sink = Arc::new(HttpSink::new(format!("{base_url}down/_doc/"), Duration::from_secs(5)).unwrap());

    let config = BackfillConfig {
        horizon: Duration::from_secs(5 * 60),
        ..BackfillConfig::default()
    };
    let report = BackfillCoordinator::new(sink, config)
        .run(Utc::now(), CancellationToken::new())
        .await;

    assert!(report.events.generated > 0);
    assert_eq!(report.events.failed, report.events.generated);
}

#[tokio::test]
async fn test_readiness_succeeds_once_destination_answers() {
    let base_url = spawn_destination(Received::default()).await;
    let client = reqwest::Client::new();

    wait_for_ready(&client, &base_url, Duration::from_secs(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_readiness_times_out_on_unhealthy_destination() {
    let base_url = spawn_destination(Received::default()).await;
    let client = reqwest::Client::new();

    let err = wait_for_ready(&client, &format!("{base_url}down/"), Duration::from_millis(1200))
        .await
        .unwrap_err();
    assert!(matches!(err, ReadinessError::TimedOut { .. }));
}
