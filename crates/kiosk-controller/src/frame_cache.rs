//! Single-slot cache holding the latest encoded frame.
//!
//! Writers replace the slot wholesale; readers get a [`Bytes`] handle to a
//! complete frame or nothing. `Bytes` is immutable and reference counted, so
//! a frame handed to a reader can never change or be freed underneath it
//! when the next frame arrives.
//!
//! Writers wait for the slot lock for a bounded time only. A frame that
//! cannot be stored in time is dropped; the next one will replace it anyway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

/// Whether a frame made it into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    /// The slot stayed locked past the put timeout.
    Dropped,
}

/// Store/drop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_stored: u64,
    pub frames_dropped: u64,
}

/// Latest-frame cache shared between the capture worker and HTTP readers.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use bytes::Bytes;
/// use kiosk_controller::{FrameCache, PutOutcome};
///
/// #[tokio::main]
/// async fn main() {
///     let cache = FrameCache::new(Duration::from_millis(100));
///     assert!(cache.get().await.is_none());
///
///     let outcome = cache.put(Bytes::from_static(b"\xFF\xD8..\xFF\xD9")).await;
///     assert_eq!(outcome, PutOutcome::Stored);
///     assert_eq!(cache.get().await.unwrap().len(), 6);
/// }
/// ```
#[derive(Debug)]
pub struct FrameCache {
    slot: Mutex<Option<Bytes>>,
    put_timeout: Duration,
    stored: AtomicU64,
    dropped: AtomicU64,
}

impl FrameCache {
    pub fn new(put_timeout: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            put_timeout,
            stored: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Replace the cached frame, waiting at most the put timeout for the lock.
    pub async fn put(&self, frame: Bytes) -> PutOutcome {
        match tokio::time::timeout(self.put_timeout, self.slot.lock()).await {
            Ok(mut slot) => {
                *slot = Some(frame);
                self.stored.fetch_add(1, Ordering::Relaxed);
                PutOutcome::Stored
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    timeout_ms = self.put_timeout.as_millis() as u64,
                    "Frame cache busy, frame dropped"
                );
                PutOutcome::Dropped
            }
        }
    }

    /// Latest complete frame, if any.
    pub async fn get(&self) -> Option<Bytes> {
        self.slot.lock().await.clone()
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frames_stored: self.stored.load(Ordering::Relaxed),
            frames_dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            kiosk_core::constants::DEFAULT_FRAME_PUT_TIMEOUT_MS,
        ))
    }
}
