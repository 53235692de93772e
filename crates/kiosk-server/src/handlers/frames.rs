//! Frame endpoints: single JPEG and MJPEG stream.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use bytes::{BufMut, Bytes, BytesMut};
use kiosk_controller::Orchestrator;
use kiosk_core::SystemState;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const BOUNDARY: &str = "frame";

fn ensure_scanning(orchestrator: &Orchestrator) -> AppResult<()> {
    match orchestrator.state() {
        SystemState::Scanning => Ok(()),
        state => Err(AppError::forbidden(format!("Camera is off in state {state}"))),
    }
}

/// `GET /jpg`
pub async fn jpg_handler(State(state): State<AppState>) -> AppResult<Response> {
    ensure_scanning(&state.orchestrator)?;

    let frame = state
        .orchestrator
        .frames()
        .get()
        .await
        .ok_or_else(|| AppError::unavailable("No frame captured yet"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        frame,
    )
        .into_response())
}

/// `GET /stream`: multipart MJPEG until the kiosk leaves `SCANNING`.
pub async fn stream_handler(State(state): State<AppState>) -> AppResult<Response> {
    ensure_scanning(&state.orchestrator)?;
    if state.orchestrator.frames().get().await.is_none() {
        return Err(AppError::unavailable("No frame captured yet"));
    }

    let stream = futures::stream::unfold(
        (Arc::clone(&state.orchestrator), state.stream_interval, true),
        |(orchestrator, interval, first)| async move {
            next_part(&orchestrator, interval, first)
                .await
                .map(|part| (Ok::<_, Infallible>(part), (orchestrator, interval, false)))
        },
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                format!("multipart/x-mixed-replace; boundary={BOUNDARY}"),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Next stream part, or `None` once scanning is over.
async fn next_part(orchestrator: &Orchestrator, interval: Duration, first: bool) -> Option<Bytes> {
    if !first {
        tokio::time::sleep(interval).await;
    }
    loop {
        if !orchestrator.state().is_scanning() {
            debug!("Scan over, closing frame stream");
            return None;
        }
        if let Some(frame) = orchestrator.frames().get().await {
            return Some(encode_part(&frame));
        }
        tokio::time::sleep(interval).await;
    }
}

fn encode_part(jpeg: &[u8]) -> Bytes {
    let head = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    );
    let mut part = BytesMut::with_capacity(head.len() + jpeg.len() + 2);
    part.put_slice(head.as_bytes());
    part.put_slice(jpeg);
    part.put_slice(b"\r\n");
    part.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_part_layout() {
        let part = encode_part(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let head = b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 4\r\n\r\n";
        assert!(part.starts_with(head));
        assert_eq!(&part[head.len()..], &[0xFF, 0xD8, 0xFF, 0xD9, b'\r', b'\n']);
    }
}
