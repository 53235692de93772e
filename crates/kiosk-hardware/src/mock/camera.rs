//! Mock camera producing synthetic frames.
//!
//! Every `capture_frame()` yields a new small frame whose pixels encode its
//! sequence number, and `encode_jpeg()` wraps the pixels between JPEG
//! start/end markers. One-shot faults can be injected through the handle.

use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::CameraDevice,
    types::{DeviceInfo, RawFrame},
};

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

#[derive(Debug)]
enum CameraEvent {
    NoFrame,
    CaptureFault(String),
    EncodeFault(String),
    Exhausted,
}

/// Mock camera for testing and development.
#[derive(Debug)]
pub struct MockCamera {
    event_rx: mpsc::UnboundedReceiver<CameraEvent>,
    pending_encode_fault: Option<HardwareError>,
    sequence: u64,
    width: u16,
    height: u16,
}

impl MockCamera {
    /// Create a 4x4 mock camera and its control handle.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_resolution(4, 4)
    }

    pub fn with_resolution(width: u16, height: u16) -> (Self, MockCameraHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let camera = Self {
            event_rx,
            pending_encode_fault: None,
            sequence: 0,
            width,
            height,
        };
        (camera, MockCameraHandle { event_tx })
    }

    fn next_frame(&mut self) -> RawFrame {
        self.sequence += 1;
        let len = usize::from(self.width) * usize::from(self.height);
        let data = self.sequence.to_le_bytes().iter().copied().cycle().take(len).collect();
        RawFrame {
            width: self.width,
            height: self.height,
            sequence: self.sequence,
            data,
        }
    }
}

impl CameraDevice for MockCamera {
    async fn capture_frame(&mut self) -> Result<Option<RawFrame>> {
        if let Ok(event) = self.event_rx.try_recv() {
            match event {
                CameraEvent::NoFrame => return Ok(None),
                CameraEvent::CaptureFault(message) => {
                    return Err(HardwareError::communication(message));
                }
                CameraEvent::EncodeFault(message) => {
                    self.pending_encode_fault = Some(HardwareError::encoding(message));
                }
                CameraEvent::Exhausted => {
                    self.pending_encode_fault =
                        Some(HardwareError::resource_exhausted("no jpeg output buffer"));
                }
            }
        }
        Ok(Some(self.next_frame()))
    }

    async fn encode_jpeg(&mut self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>> {
        if let Some(error) = self.pending_encode_fault.take() {
            return Err(error);
        }
        if quality > 100 {
            return Err(HardwareError::invalid_data(format!(
                "JPEG quality must be 0-100, got {quality}"
            )));
        }

        let mut jpeg = Vec::with_capacity(frame.data.len() + JPEG_SOI.len() + JPEG_EOI.len());
        jpeg.extend_from_slice(&JPEG_SOI);
        jpeg.extend_from_slice(&frame.data);
        jpeg.extend_from_slice(&JPEG_EOI);
        Ok(jpeg)
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Mock Camera", format!("{}x{}", self.width, self.height)))
    }
}

/// Handle for injecting faults into a [`MockCamera`].
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    event_tx: mpsc::UnboundedSender<CameraEvent>,
}

impl MockCameraHandle {
    fn send(&self, event: CameraEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Next capture finds no frame ready.
    pub fn skip_frame(&self) {
        self.send(CameraEvent::NoFrame);
    }

    /// Next capture fails.
    pub fn fail_capture(&self, message: impl Into<String>) {
        self.send(CameraEvent::CaptureFault(message.into()));
    }

    /// Next encode fails.
    pub fn fail_encode(&self, message: impl Into<String>) {
        self.send(CameraEvent::EncodeFault(message.into()));
    }

    /// Next encode cannot get an output buffer.
    pub fn exhaust_buffers(&self) {
        self.send(CameraEvent::Exhausted);
    }
}
