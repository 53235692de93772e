use axum::{Json, body::Bytes, extract::State};
use kiosk_controller::Event;
use kiosk_core::StatusRecord;
use serde_json::Value;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// `POST /start_enroll` with body `{"id": n}`.
///
/// The body is parsed by hand so that every malformed request, whatever
/// the reason, is a 400.
pub async fn start_enroll_handler(State(state): State<AppState>, body: Bytes) -> AppResult<Json<StatusRecord>> {
    let id = parse_enroll_id(&body)?;
    state.orchestrator.transition(Event::EnrollRequest(id))?;
    info!(id, "Enrollment requested");
    Ok(Json(state.orchestrator.status()))
}

fn parse_enroll_id(body: &[u8]) -> AppResult<i64> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| AppError::bad_request("Body must be a JSON object"))?;

    match value.get("id") {
        None | Some(Value::Null) => Err(AppError::bad_request("Missing id")),
        Some(id) => id
            .as_i64()
            .ok_or_else(|| AppError::bad_request("id must be an integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enroll_id() {
        assert_eq!(parse_enroll_id(br#"{"id": 5}"#).unwrap(), 5);
        assert_eq!(parse_enroll_id(br#"{"id": 200}"#).unwrap(), 200);

        for bad in [&br#"{}"#[..], br#"{"id": null}"#, br#"{"id": "5"}"#, br#"{"id": 5.5}"#, b"id=5"] {
            assert_eq!(parse_enroll_id(bad).unwrap_err().status, axum::http::StatusCode::BAD_REQUEST);
        }
    }
}
