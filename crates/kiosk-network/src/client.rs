//! Outbound record-update client.
//!
//! After a QR code is accepted, the kiosk tells a remote service which
//! laptop was collected and by whom. This module provides the
//! [`RecordUpdater`] seam, an HTTP implementation over `reqwest`, and a mock
//! for tests.
//!
//! # Architecture
//!
//! ```text
//! CodeWorker
//!     │
//!     └─> AnyRecordUpdater
//!             │
//!             ├─> HttpRecordUpdater ───(HTTPS POST, bearer auth)───> records service
//!             ├─> MockRecordUpdater ───(channel)───> test handle
//!             └─> Disabled (no endpoint configured)
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: one request per accepted code
//! - **Bounded**: every request carries a timeout
//! - **No locks**: callers invoke it with no kiosk lock held
//!
//! The session id travels with every update so the remote side can
//! correlate duplicates; nothing here assumes the call is idempotent.

#![allow(async_fn_in_trait)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use kiosk_core::{AuthenticatedSession, LaptopTicket};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default per-request timeout.
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of one record update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub laptop_id: u32,
    pub laptop_name: String,
    pub user_id: u16,
    pub session_id: Uuid,
    pub scanned_at: DateTime<Utc>,
}

impl RecordUpdate {
    /// Build the update for `ticket` collected during `session`.
    pub fn new(ticket: &LaptopTicket, session: &AuthenticatedSession) -> Self {
        Self {
            laptop_id: ticket.laptop_id,
            laptop_name: ticket.name.clone(),
            user_id: session.user_id.as_u16(),
            session_id: session.session_id,
            scanned_at: Utc::now(),
        }
    }
}

/// Errors that can occur while submitting a record update
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The HTTP client could not be built
    #[error("Client setup failed: {0}")]
    Setup(String),

    /// Request did not complete in time
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Remote service answered with a non-success status
    #[error("Remote rejected update with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Connection or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<UpdateError> for kiosk_core::Error {
    fn from(error: UpdateError) -> Self {
        kiosk_core::Error::ExternalCallFailure(error.to_string())
    }
}

/// Something that can persist a record update.
pub trait RecordUpdater: Send + Sync {
    /// Submit one update.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError`] if the remote side could not be reached or
    /// refused the update. Callers only log it.
    async fn submit(&self, update: &RecordUpdate) -> Result<(), UpdateError>;
}

/// Configuration for [`HttpRecordUpdater`]
#[derive(Debug, Clone)]
pub struct HttpUpdaterConfig {
    /// Full URL the update is POSTed to
    pub endpoint: String,

    /// Bearer token, sent as `Authorization: Bearer <key>` when present
    pub api_key: Option<String>,

    /// Timeout for the whole request
    pub timeout: Duration,
}

/// Record updater speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpRecordUpdater {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpRecordUpdater {
    /// Create a new updater.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Setup`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: HttpUpdaterConfig) -> Result<Self, UpdateError> {
        debug!("Creating record updater for {}", config.endpoint);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpdateError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }
}

impl RecordUpdater for HttpRecordUpdater {
    async fn submit(&self, update: &RecordUpdate) -> Result<(), UpdateError> {
        let mut request = self.client.post(&self.endpoint).json(update);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UpdateError::Timeout(self.timeout.as_millis() as u64)
            } else {
                UpdateError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Record update rejected");
            return Err(UpdateError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            laptop_id = update.laptop_id,
            user_id = update.user_id,
            session_id = %update.session_id,
            "Record updated"
        );
        Ok(())
    }
}

/// Mock updater forwarding every update to its handle.
#[derive(Debug, Clone)]
pub struct MockRecordUpdater {
    update_tx: mpsc::UnboundedSender<RecordUpdate>,
    fail_next: Arc<AtomicBool>,
    stall_next: Arc<AtomicBool>,
}

impl MockRecordUpdater {
    pub fn new() -> (Self, MockRecordHandle) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let fail_next = Arc::new(AtomicBool::new(false));
        let stall_next = Arc::new(AtomicBool::new(false));
        (
            Self {
                update_tx,
                fail_next: Arc::clone(&fail_next),
                stall_next: Arc::clone(&stall_next),
            },
            MockRecordHandle {
                update_rx,
                fail_next,
                stall_next,
            },
        )
    }
}

impl RecordUpdater for MockRecordUpdater {
    async fn submit(&self, update: &RecordUpdate) -> Result<(), UpdateError> {
        // Recorded even when failing, so tests can see the attempt.
        let _ = self.update_tx.send(update.clone());
        if self.stall_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(UpdateError::Transport("mock failure".to_string()));
        }
        Ok(())
    }
}

/// Handle observing a [`MockRecordUpdater`].
#[derive(Debug)]
pub struct MockRecordHandle {
    update_rx: mpsc::UnboundedReceiver<RecordUpdate>,
    fail_next: Arc<AtomicBool>,
    stall_next: Arc<AtomicBool>,
}

impl MockRecordHandle {
    /// Wait for the next submitted update.
    pub async fn next_update(&mut self) -> Option<RecordUpdate> {
        self.update_rx.recv().await
    }

    /// Pop an already submitted update without waiting.
    pub fn try_next_update(&mut self) -> Option<RecordUpdate> {
        self.update_rx.try_recv().ok()
    }

    /// The next submission fails.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// The next submission never answers, like a server that accepts and hangs.
    pub fn stall_next(&self) {
        self.stall_next.store(true, Ordering::SeqCst);
    }
}

/// Enum wrapper for record updater dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRecordUpdater {
    Http(HttpRecordUpdater),
    Mock(MockRecordUpdater),
    /// No endpoint configured; updates are only logged.
    Disabled,
}

impl RecordUpdater for AnyRecordUpdater {
    async fn submit(&self, update: &RecordUpdate) -> Result<(), UpdateError> {
        match self {
            Self::Http(updater) => updater.submit(update).await,
            Self::Mock(updater) => updater.submit(update).await,
            Self::Disabled => {
                debug!(laptop_id = update.laptop_id, "Record update disabled, skipping");
                Ok(())
            }
        }
    }
}
