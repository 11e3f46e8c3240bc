use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use nirogya_core::errors::{DatabaseError, TransportError};
use nirogya_core::reports::{
    OfflineReportRecord, ReportId, ReportPayload, ReportStoreTrait, ReportSubmitterTrait,
    SubmissionReceipt,
};
use nirogya_core::sync::{ConnectivityMonitor, ReportSyncService};
use nirogya_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, OfflineReportRepository,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::main_lib::{app_router, AppState};

#[derive(Default)]
struct CountingSubmitter {
    calls: AtomicUsize,
}

#[async_trait]
impl ReportSubmitterTrait for CountingSubmitter {
    async fn submit(
        &self,
        _payload: &ReportPayload,
        _client_ref: &str,
    ) -> Result<SubmissionReceipt, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SubmissionReceipt {
            response: json!({ "status": "accepted" }),
        })
    }
}

struct BrokenStore;

#[async_trait]
impl ReportStoreTrait for BrokenStore {
    async fn save_report(&self, _payload: ReportPayload) -> nirogya_core::Result<ReportId> {
        Err(DatabaseError::QueryFailed("disk I/O error".to_string()).into())
    }
    fn get_pending_count(&self) -> nirogya_core::Result<i64> {
        Ok(0)
    }
    fn get_pending_reports(&self) -> nirogya_core::Result<Vec<OfflineReportRecord>> {
        Ok(Vec::new())
    }
    fn get_report(&self, _id: ReportId) -> nirogya_core::Result<Option<OfflineReportRecord>> {
        Ok(None)
    }
    async fn mark_as_synced(&self, _id: ReportId) -> nirogya_core::Result<()> {
        Ok(())
    }
    async fn update_sync_attempt(
        &self,
        _id: ReportId,
        _error_message: String,
    ) -> nirogya_core::Result<()> {
        Ok(())
    }
    async fn clear_synced_reports(&self) -> nirogya_core::Result<usize> {
        Ok(0)
    }
}

struct TestApp {
    router: Router,
    service: Arc<ReportSyncService>,
    submitter: Arc<CountingSubmitter>,
    _dir: tempfile::TempDir,
}

fn test_app(online: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_path = init(&dir.path().to_string_lossy()).unwrap();
    run_migrations(&db_path).unwrap();
    let pool = create_pool(&db_path).unwrap();
    let writer = spawn_writer(pool.as_ref().clone());
    let store = Arc::new(OfflineReportRepository::new(pool, writer));

    let submitter = Arc::new(CountingSubmitter::default());
    let service = Arc::new(ReportSyncService::new(
        store,
        submitter.clone(),
        ConnectivityMonitor::new(online),
    ));
    service.initialize().unwrap();

    TestApp {
        router: app_router(Arc::new(AppState {
            service: service.clone(),
        })),
        service,
        submitter,
        _dir: dir,
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn report_body() -> Value {
    json!({
        "patient": { "name": "Rina", "age": 34, "symptoms": ["fever", "vomiting"] },
        "meta": { "village": "Majuli", "reported_by": "asha-17" }
    })
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app(true);
    let (status, body) = send(&app.router, empty_request(Method::GET, "/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn offline_submission_is_queued() {
    let app = test_app(false);

    let (status, body) = send(
        &app.router,
        json_request(Method::POST, "/api/reports", report_body()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["savedLocally"], true);
    assert_eq!(body["synced"], false);
    assert_eq!(body["error"], "offline, will retry");

    let (_, pending) = send(&app.router, empty_request(Method::GET, "/api/reports/pending")).await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["status"], "pending");
    assert_eq!(pending[0]["payload"]["patient"]["age"], 34);
    assert_eq!(app.submitter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn online_submission_is_delivered_immediately() {
    let app = test_app(true);

    let (status, body) = send(
        &app.router,
        json_request(Method::POST, "/api/reports", report_body()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["synced"], true);
    assert!(body["error"].is_null());
    assert_eq!(app.submitter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.service.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn trigger_drains_queue_after_reconnect_and_synced_rows_can_be_cleared() {
    let app = test_app(false);
    for _ in 0..2 {
        send(
            &app.router,
            json_request(Method::POST, "/api/reports", report_body()),
        )
        .await;
    }

    let (_, skipped) = send(&app.router, empty_request(Method::POST, "/api/sync/trigger")).await;
    assert_eq!(skipped, json!({ "success": 0, "failed": 0 }));

    let (status, body) = send(
        &app.router,
        json_request(Method::PUT, "/api/sync/connectivity", json!({ "online": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "online": true, "changed": true }));

    let (_, result) = send(&app.router, empty_request(Method::POST, "/api/sync/trigger")).await;
    assert_eq!(result, json!({ "success": 2, "failed": 0 }));

    let (_, sync_status) = send(&app.router, empty_request(Method::GET, "/api/sync/status")).await;
    assert_eq!(sync_status["syncing"], false);
    assert_eq!(sync_status["pendingCount"], 0);
    assert!(sync_status["lastSyncTime"].is_string());

    let (_, cleared) = send(
        &app.router,
        empty_request(Method::DELETE, "/api/reports/synced"),
    )
    .await;
    assert_eq!(cleared, json!({ "removed": 2 }));
}

#[tokio::test]
async fn storage_failure_is_a_server_error() {
    let service = Arc::new(ReportSyncService::new(
        Arc::new(BrokenStore),
        Arc::new(CountingSubmitter::default()),
        ConnectivityMonitor::new(true),
    ));
    let router = app_router(Arc::new(AppState { service }));

    let (status, body) = send(
        &router,
        json_request(Method::POST, "/api/reports", report_body()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "internal");
    assert!(body["message"].as_str().unwrap().contains("disk I/O error"));
}

#[tokio::test]
async fn submission_without_payload_fields_is_rejected() {
    let app = test_app(true);
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/reports",
            json!({ "patient": {} }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(app.service.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn event_stream_starts_with_current_status() {
    let app = test_app(false);
    app.service
        .save_and_sync(ReportPayload::new(json!({ "name": "a" }), json!({})))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, "/api/sync/events"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let mut stream = response.into_body().into_data_stream();
    let first = stream.next().await.unwrap().unwrap();
    let frame = String::from_utf8(first.to_vec()).unwrap();
    assert!(frame.contains("event: sync-status"));
    assert!(frame.contains("\"pendingCount\":1"));
}
