//! Camera capture worker.
//!
//! While scanning, grabs a frame, encodes it and stores it in the frame
//! cache, once per frame interval. While inactive it parks on its
//! activation flag.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kiosk_hardware::{AnyCamera, CameraDevice};
use tracing::{debug, info, trace, warn};

use crate::activation::ActivationListener;
use crate::frame_cache::{FrameCache, PutOutcome};

pub struct CaptureWorker {
    camera: AnyCamera,
    frames: Arc<FrameCache>,
    active: ActivationListener,
    interval: Duration,
    quality: u8,
}

impl CaptureWorker {
    pub fn new(
        camera: AnyCamera,
        frames: Arc<FrameCache>,
        active: ActivationListener,
        config: &crate::ControllerConfig,
    ) -> Self {
        Self {
            camera,
            frames,
            active,
            interval: config.frame_interval,
            quality: config.jpeg_quality,
        }
    }

    pub async fn run(mut self) {
        info!("Capture worker started");

        while self.active.wait_active().await.is_ok() {
            self.capture_once().await;
            tokio::time::sleep(self.interval).await;
        }

        info!("Capture worker stopped");
    }

    async fn capture_once(&mut self) {
        let frame = match self.camera.capture_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                trace!("No frame ready");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Frame capture failed");
                return;
            }
        };

        let jpeg = match self.camera.encode_jpeg(&frame, self.quality).await {
            Ok(jpeg) => jpeg,
            Err(e) if e.is_transient() => {
                debug!(error = %e, sequence = frame.sequence, "Frame skipped");
                return;
            }
            Err(e) => {
                warn!(error = %e, sequence = frame.sequence, "Frame encoding failed");
                return;
            }
        };

        // Deactivated while encoding: the frame belongs to a finished scan.
        // `store` repeats the check after the put.
        if !self.active.is_active() {
            debug!(sequence = frame.sequence, "Discarding frame captured before deactivation");
            return;
        }

        self.store(Bytes::from(jpeg), frame.sequence).await;
    }

    /// Put a frame, then take it back out if the scan ended during the put.
    async fn store(&self, jpeg: Bytes, sequence: u64) {
        if self.frames.put(jpeg).await != PutOutcome::Stored {
            return;
        }
        if self.active.is_active() {
            trace!(sequence, "Frame stored");
        } else {
            debug!(sequence, "Scan ended during put, clearing frame");
            self.frames.clear().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::WorkerActivations;
    use crate::ControllerConfig;
    use kiosk_core::SystemState;
    use kiosk_hardware::mock::{MockCamera, MockCameraHandle};

    #[tokio::test(start_paused = true)]
    async fn test_frames_only_while_scanning() {
        let frames = Arc::new(FrameCache::default());
        let (activations, listeners) = WorkerActivations::new(SystemState::Locked);
        let (camera, handle) = MockCamera::new();

        let worker = CaptureWorker::new(
            AnyCamera::Mock(camera),
            Arc::clone(&frames),
            listeners.capture,
            &ControllerConfig::default(),
        );
        tokio::spawn(worker.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(frames.get().await.is_none());

        activations.apply(SystemState::Scanning);
        handle.fail_encode("bad huffman table");
        tokio::time::sleep(Duration::from_millis(300)).await;

        let frame = frames.get().await.unwrap();
        assert!(frame.starts_with(&[0xFF, 0xD8]));
        let stored = frames.stats().frames_stored;
        assert!(stored > 1);

        activations.apply(SystemState::Success);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_stop = frames.stats().frames_stored;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(frames.stats().frames_stored, after_stop);
    }

    fn capture_worker(state: SystemState) -> (CaptureWorker, WorkerActivations, Arc<FrameCache>, MockCameraHandle) {
        let frames = Arc::new(FrameCache::default());
        let (activations, listeners) = WorkerActivations::new(state);
        let (camera, handle) = MockCamera::new();
        let worker = CaptureWorker::new(
            AnyCamera::Mock(camera),
            Arc::clone(&frames),
            listeners.capture,
            &ControllerConfig::default(),
        );
        (worker, activations, frames, handle)
    }

    #[tokio::test]
    async fn test_frame_cleared_when_scan_ends_during_put() {
        let (worker, activations, frames, _handle) = capture_worker(SystemState::Scanning);

        worker.store(Bytes::from_static(b"\xFF\xD8a\xFF\xD9"), 1).await;
        assert!(frames.get().await.is_some());

        activations.apply(SystemState::Success);
        worker.store(Bytes::from_static(b"\xFF\xD8b\xFF\xD9"), 2).await;
        assert!(frames.get().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_fault_skips_one_frame() {
        let (mut worker, _activations, frames, handle) = capture_worker(SystemState::Scanning);

        handle.fail_capture("usb reset");
        worker.capture_once().await;
        assert!(frames.get().await.is_none());
        assert_eq!(frames.stats().frames_stored, 0);

        worker.capture_once().await;
        assert!(frames.get().await.is_some());
    }
}
