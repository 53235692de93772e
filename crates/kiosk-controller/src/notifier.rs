//! Best-effort push notifications.
//!
//! Every applied transition pushes a `status` message and every enrollment
//! stage pushes an `enroll_status` message. Delivery goes through a
//! `tokio::sync::broadcast` channel: a subscriber that falls behind skips
//! the messages it missed and nobody ever waits on a slow reader.

use kiosk_core::{StatusRecord, SystemState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of buffered messages per subscriber.
pub const DEFAULT_PUSH_CAPACITY: usize = 64;

/// Coarse indicator shown next to an enrollment message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Sensor is busy, nothing for the user to do.
    Wait,
    /// User action expected.
    Go,
    Error,
    Success,
}

/// One enrollment progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollStatus {
    pub status: ProgressStatus,
    pub message: String,
}

impl EnrollStatus {
    pub fn new(status: ProgressStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Message delivered to push subscribers, serialised with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    Status {
        state: SystemState,
        payload: String,
    },
    EnrollStatus {
        status: ProgressStatus,
        message: String,
    },
}

impl From<StatusRecord> for PushMessage {
    fn from(record: StatusRecord) -> Self {
        Self::Status {
            state: record.state,
            payload: record.payload,
        }
    }
}

impl From<EnrollStatus> for PushMessage {
    fn from(status: EnrollStatus) -> Self {
        Self::EnrollStatus {
            status: status.status,
            message: status.message,
        }
    }
}

/// Fan-out of [`PushMessage`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    tx: broadcast::Sender<PushMessage>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Push to every current subscriber. Never blocks, never fails.
    pub fn push(&self, message: impl Into<PushMessage>) {
        let message = message.into();
        match self.tx.send(message) {
            Ok(receivers) => trace!(receivers, "Pushed message"),
            Err(_) => trace!("No push subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.tx.subscribe()
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_PUSH_CAPACITY)
    }
}
