//! Network side of the kiosk: the outbound record-update client.
//!
//! See [`client`] for the [`RecordUpdater`] seam and its implementations.

pub mod client;

pub use client::{
    AnyRecordUpdater, DEFAULT_UPDATE_TIMEOUT, HttpRecordUpdater, HttpUpdaterConfig,
    MockRecordHandle, MockRecordUpdater, RecordUpdate, RecordUpdater, UpdateError,
};
