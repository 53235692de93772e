//! HTTP query/control surface and WebSocket push channel of the kiosk.
//!
//! | route               | purpose                                   |
//! |---------------------|-------------------------------------------|
//! | `GET /status`       | current state and payload as JSON         |
//! | `GET /jpg`          | latest frame while scanning               |
//! | `GET /stream`       | MJPEG stream while scanning               |
//! | `GET /qr`           | accepted code while in success            |
//! | `POST /start_enroll`| start a fingerprint enrollment            |
//! | `GET /ws`           | push channel for status and enrollment    |

pub mod error;
pub mod handlers;
pub mod state;

use std::future::Future;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{AppError, AppResult};
pub use state::AppState;

use handlers::{enroll, frames, push, status};

/// Build the kiosk router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status::status_handler))
        .route("/qr", get(status::qr_handler))
        .route("/jpg", get(frames::jpg_handler))
        .route("/stream", get(frames::stream_handler))
        .route("/start_enroll", post(enroll::start_enroll_handler))
        .route("/ws", get(push::push_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an I/O error if the listener fails.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP server listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
