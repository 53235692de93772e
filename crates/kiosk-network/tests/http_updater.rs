//! Integration tests for HttpRecordUpdater
//!
//! These tests run a local axum server standing in for the records service
//! and verify the request body, the bearer header and error mapping.

use std::time::Duration;

use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
use kiosk_core::{AuthenticatedSession, LaptopTicket, UserId};
use kiosk_network::{HttpRecordUpdater, HttpUpdaterConfig, RecordUpdate, RecordUpdater, UpdateError};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/records")
}

fn sample_update() -> RecordUpdate {
    let ticket = LaptopTicket::parse("1;42-LaptopA").unwrap();
    let session = AuthenticatedSession::new(UserId::new(7));
    RecordUpdate::new(&ticket, &session)
}

/// Test the body and authorization header reach the server
#[tokio::test]
async fn test_posts_json_with_bearer() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

    let router = Router::new().route(
        "/records",
        post(move |headers: HeaderMap, Json(body): Json<RecordUpdate>| {
            let seen_tx = seen_tx.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                seen_tx.send((auth, body)).unwrap();
                StatusCode::NO_CONTENT
            }
        }),
    );
    let endpoint = spawn_server(router).await;

    let updater = HttpRecordUpdater::new(HttpUpdaterConfig {
        endpoint,
        api_key: Some("s3cret".to_string()),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let update = sample_update();
    updater.submit(&update).await.unwrap();

    let (auth, body) = seen_rx.recv().await.unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer s3cret"));
    assert_eq!(body, update);
}

/// Test a non-success status is surfaced as Rejected
#[tokio::test]
async fn test_rejected_status() {
    let router = Router::new().route(
        "/records",
        post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
    );
    let endpoint = spawn_server(router).await;

    let updater = HttpRecordUpdater::new(HttpUpdaterConfig {
        endpoint,
        api_key: None,
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    match updater.submit(&sample_update()).await {
        Err(UpdateError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

/// Test a slow server trips the request timeout
#[tokio::test]
async fn test_timeout() {
    let router = Router::new().route(
        "/records",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let endpoint = spawn_server(router).await;

    let updater = HttpRecordUpdater::new(HttpUpdaterConfig {
        endpoint,
        api_key: None,
        timeout: Duration::from_millis(100),
    })
    .unwrap();

    let result = updater.submit(&sample_update()).await;
    assert!(matches!(result, Err(UpdateError::Timeout(100))));
}

/// Test an unreachable endpoint is a transport error
#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let updater = HttpRecordUpdater::new(HttpUpdaterConfig {
        endpoint: format!("http://{addr}/records"),
        api_key: None,
        timeout: Duration::from_secs(1),
    })
    .unwrap();

    let result = updater.submit(&sample_update()).await;
    assert!(matches!(result, Err(UpdateError::Transport(_))));
}
