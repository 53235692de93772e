use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use kiosk_core::StatusRecord;

use crate::state::AppState;

/// `GET /status`
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusRecord> {
    Json(state.orchestrator.status())
}

/// `GET /qr`: the accepted code while in `SUCCESS`, otherwise no content.
pub async fn qr_handler(State(state): State<AppState>) -> Response {
    match state.orchestrator.accepted_code() {
        Some(code) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], code).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
