//! Route tests driven through `tower::ServiceExt::oneshot`, plus one
//! WebSocket test against a real listener.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes, to_bytes},
    http::{Request, StatusCode, header},
};
use futures::StreamExt;
use kiosk_controller::{EnrollOutcome, Event, EventNotifier, FrameCache, Orchestrator, OrchestratorLinks};
use kiosk_core::{LaptopTicket, UserId};
use kiosk_server::{AppState, router};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

fn setup() -> (Arc<Orchestrator>, OrchestratorLinks, AppState) {
    let (orchestrator, links) =
        Orchestrator::new(Arc::new(FrameCache::default()), EventNotifier::default());
    let orchestrator = Arc::new(orchestrator);
    let state = AppState::new(Arc::clone(&orchestrator), Duration::from_millis(10));
    (orchestrator, links, state)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, Bytes) {
    let response = router(state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, to_bytes(response.into_body(), usize::MAX).await.unwrap())
}

async fn start_enroll(state: &AppState, body: &str) -> (StatusCode, Value) {
    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/start_enroll")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_status_reports_state_and_payload() {
    let (orchestrator, _links, state) = setup();

    let (status, body) = get(&state, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({"state": "LOCKED", "payload": ""})
    );

    orchestrator.transition(Event::BiometricMatch(UserId::new(7))).unwrap();
    let (_, body) = get(&state, "/status").await;
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({"state": "SCANNING", "payload": "Fingerprint OK. Scan QR Code..."})
    );
}

#[tokio::test]
async fn test_start_enroll_rejects_bad_ids() {
    let (orchestrator, _links, state) = setup();

    for body in [r#"{"id": 200}"#, r#"{"id": 0}"#, r#"{"id": "x"}"#, r#"{}"#, "not json"] {
        let (status, _) = start_enroll(&state, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
    }
    assert_eq!(orchestrator.status().payload, "");
}

#[tokio::test]
async fn test_start_enroll_busy_while_scanning() {
    let (orchestrator, mut links, state) = setup();
    orchestrator.transition(Event::BiometricMatch(UserId::new(7))).unwrap();

    let (status, body) = start_enroll(&state, r#"{"id": 5}"#).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["status"], 409);
    assert!(links.enroll_jobs.try_recv().is_err());
}

#[tokio::test]
async fn test_start_enroll_accepted_while_locked() {
    let (orchestrator, mut links, state) = setup();

    let (status, body) = start_enroll(&state, r#"{"id": 5}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"state": "ENROLLING", "payload": "Enrolling fingerprint #5"}));
    assert_eq!(links.enroll_jobs.try_recv().unwrap().target.as_u8(), 5);

    let (status, _) = start_enroll(&state, r#"{"id": 6}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);

    orchestrator.transition(Event::EnrollDone(EnrollOutcome::Stored)).unwrap();
}

#[tokio::test]
async fn test_start_enroll_without_worker_is_unavailable() {
    let (_orchestrator, links, state) = setup();
    drop(links);

    let (status, _) = start_enroll(&state, r#"{"id": 5}"#).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_jpg_preconditions() {
    let (orchestrator, _links, state) = setup();

    let (status, _) = get(&state, "/jpg").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    orchestrator.transition(Event::BiometricMatch(UserId::new(7))).unwrap();
    let (status, _) = get(&state, "/jpg").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    orchestrator.frames().put(Bytes::from_static(b"\xFF\xD8jpeg\xFF\xD9")).await;
    let response = router(state.clone())
        .oneshot(Request::builder().uri("/jpg").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, Bytes::from_static(b"\xFF\xD8jpeg\xFF\xD9"));
}

#[tokio::test]
async fn test_qr_only_while_success() {
    let (orchestrator, _links, state) = setup();

    let (status, body) = get(&state, "/qr").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    orchestrator.transition(Event::BiometricMatch(UserId::new(7))).unwrap();
    orchestrator
        .transition(Event::QrValid(LaptopTicket::parse("1;42-LaptopA").unwrap()))
        .unwrap();

    let (status, body) = get(&state, "/qr").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from_static(b"1;42-LaptopA"));
}

#[tokio::test]
async fn test_stream_ends_when_scan_is_over() {
    let (orchestrator, _links, state) = setup();

    let (status, _) = get(&state, "/stream").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    orchestrator.transition(Event::BiometricMatch(UserId::new(7))).unwrap();
    orchestrator.frames().put(Bytes::from_static(b"\xFF\xD8a\xFF\xD9")).await;

    let response = router(state.clone())
        .oneshot(Request::builder().uri("/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let ender = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        ender
            .transition(Event::QrValid(LaptopTicket::parse("1;42-LaptopA").unwrap()))
            .unwrap();
    });

    let body = tokio::time::timeout(
        Duration::from_secs(5),
        to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .expect("stream did not end")
    .unwrap();

    let text = String::from_utf8_lossy(&body);
    assert!(text.starts_with("--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 5\r\n\r\n"));
    assert!(text.matches("--frame").count() >= 2);
}

async fn next_json<S>(socket: &mut S) -> Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match socket.next().await.unwrap().unwrap() {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_push_channel_snapshot_then_updates() {
    let (orchestrator, _links, state) = setup();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(kiosk_server::serve(listener, state, std::future::pending()));

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    assert_eq!(
        next_json(&mut socket).await,
        json!({"type": "status", "state": "LOCKED", "payload": ""})
    );

    orchestrator.transition(Event::EnrollRequest(4)).unwrap();
    assert_eq!(
        next_json(&mut socket).await,
        json!({"type": "status", "state": "ENROLLING", "payload": "Enrolling fingerprint #4"})
    );

    orchestrator
        .report_enrollment(kiosk_controller::EnrollStatus::new(
            kiosk_controller::ProgressStatus::Go,
            "Place finger on sensor...",
        ))
        .unwrap();
    assert_eq!(
        next_json(&mut socket).await,
        json!({"type": "enroll_status", "status": "go", "message": "Place finger on sensor..."})
    );
}
