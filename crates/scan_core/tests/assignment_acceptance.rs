//! End-to-end acceptance: scan workflows against a live HTTP backend stub.

use std::sync::Arc;

use axum::{
    extract::Json,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use scan_core::{
    DeliveryApi, HttpDeliveryApi, ScanWorkflow, WorkflowConfig, WorkflowEvent, WorkflowState,
};
use shared::{
    domain::{OrderId, ScanBatch, WorkflowKind},
    error::ScanFailure,
    store::ScanStore,
};
use storage::Storage;

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

async fn sqlite_store() -> Arc<dyn ScanStore> {
    Arc::new(Storage::new("sqlite::memory:").await.expect("db"))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "Bearer test-token")
        .unwrap_or(false)
}

#[tokio::test]
async fn assignment_scan_succeeds_end_to_end() {
    let app = Router::new().route(
        "/order/assign",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            if !authorized(&headers) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"status": "error", "message": "Unauthorized"})),
                );
            }
            assert_eq!(body["invoiceNo"], "INV000012511001");
            (StatusCode::OK, Json(json!({"status": "success"})))
        }),
    );
    let server_url = spawn_server(app).await;

    let api = Arc::new(HttpDeliveryApi::new(&server_url, "test-token").expect("api client"));
    let workflow = ScanWorkflow::new(
        WorkflowConfig::assignment(WorkflowKind::AssignOrder, ScanBatch::empty(), "home"),
        api,
        sqlite_store().await,
    );
    let mut events = workflow.subscribe_events();

    workflow.begin_scanning().await;
    workflow.handle_scan("INV000012511001").await;

    let state = workflow.state().await;
    let modal = state.modal().expect("success modal");
    assert_eq!(modal.title, "Scan Successful");
    assert!(modal.message.contains("INV000012511001"));

    workflow.acknowledge().await;

    let mut navigated = None;
    while let Ok(event) = events.try_recv() {
        if let WorkflowEvent::Navigate { route, .. } = event {
            navigated = Some(route);
        }
    }
    assert_eq!(navigated.as_deref(), Some("home"));
}

#[tokio::test]
async fn conflicting_assignment_is_classified_from_the_response() {
    let app = Router::new().route(
        "/order/assign",
        post(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({
                    "status": "error",
                    "message": "Order already assigned to another driver"
                })),
            )
        }),
    );
    let server_url = spawn_server(app).await;

    let api = Arc::new(HttpDeliveryApi::new(&server_url, "test-token").expect("api client"));
    let workflow = ScanWorkflow::new(
        WorkflowConfig::assignment(WorkflowKind::AssignOrder, ScanBatch::empty(), "home"),
        api,
        sqlite_store().await,
    );

    workflow.begin_scanning().await;
    workflow.handle_scan("INV0002").await;

    assert_eq!(
        workflow.state().await,
        WorkflowState::Failed(ScanFailure::AssignedToOther)
    );
}

#[tokio::test]
async fn rejected_token_maps_to_session_expired() {
    let app = Router::new().route(
        "/order/hold",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": "error", "message": "Unauthorized"})),
            )
        }),
    );
    let server_url = spawn_server(app).await;

    let api = HttpDeliveryApi::new(&server_url, "stale-token").expect("api client");
    let result = api.hold_order("INV0003").await;
    assert_eq!(result, Err(ScanFailure::SessionExpired));
}

#[tokio::test]
async fn non_json_error_body_still_classifies() {
    let app = Router::new().route(
        "/order/return",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error") }),
    );
    let server_url = spawn_server(app).await;

    let api = HttpDeliveryApi::new(&server_url, "test-token").expect("api client");
    let result = api.return_order("INV0004").await;
    assert!(matches!(result, Err(ScanFailure::Server(_))));
}

#[tokio::test]
async fn signature_upload_round_trips_base64() {
    let app = Router::new().route(
        "/order/7/signature",
        post(|Json(body): Json<Value>| async move {
            let decoded = STANDARD
                .decode(body["signatureB64"].as_str().unwrap_or_default())
                .expect("valid base64");
            assert_eq!(decoded, b"png-signature-bytes");
            assert_eq!(body["orderId"], 7);
            Json(json!({"status": "success"}))
        }),
    );
    let server_url = spawn_server(app).await;

    let api = HttpDeliveryApi::new(&server_url, "test-token").expect("api client");
    api.upload_signature(OrderId(7), b"png-signature-bytes")
        .await
        .expect("upload");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_failure() {
    // Nothing listens on this port.
    let api = HttpDeliveryApi::new("http://127.0.0.1:9", "test-token").expect("api client");
    let result = api.verify_officer("DCM045").await;
    assert!(matches!(result, Err(ScanFailure::Network(_))));
}
