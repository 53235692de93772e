use std::sync::Arc;
use std::time::Duration;

use kiosk_controller::Orchestrator;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Pause between parts of the MJPEG stream.
    pub stream_interval: Duration,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, stream_interval: Duration) -> Self {
        Self {
            orchestrator,
            stream_interval,
        }
    }
}
