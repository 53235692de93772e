//! Mock fingerprint sensor for testing and development.
//!
//! The sensor answers every poll immediately, like the real serial device:
//! scripted responses queued through the [`MockFingerprintHandle`] are
//! consumed in order, and an empty script means "no finger".

use std::collections::VecDeque;

use kiosk_core::{EnrollmentId, UserId};
use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::FingerprintSensor,
    types::{DeviceInfo, ImageStatus, MatchOutcome, TemplateSlot},
};

/// Enrollment steps that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    Convert(TemplateSlot),
    CreateModel,
    StoreModel,
}

#[derive(Debug)]
enum SensorEvent {
    Identify(std::result::Result<MatchOutcome, String>),
    Image(std::result::Result<ImageStatus, String>),
    Fail(MockStep),
    Disconnect,
}

/// Mock fingerprint sensor.
///
/// # Examples
///
/// ```
/// use kiosk_core::UserId;
/// use kiosk_hardware::mock::MockFingerprintSensor;
/// use kiosk_hardware::traits::FingerprintSensor;
/// use kiosk_hardware::types::MatchOutcome;
///
/// #[tokio::main]
/// async fn main() -> kiosk_hardware::Result<()> {
///     let (mut sensor, handle) = MockFingerprintSensor::new();
///
///     assert_eq!(sensor.identify().await?, MatchOutcome::NoFinger);
///
///     handle.queue_match(UserId::new(7));
///     assert_eq!(sensor.identify().await?, MatchOutcome::Matched(UserId::new(7)));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockFingerprintSensor {
    event_rx: mpsc::UnboundedReceiver<SensorEvent>,
    stored_tx: mpsc::UnboundedSender<EnrollmentId>,
    identify_script: VecDeque<std::result::Result<MatchOutcome, String>>,
    image_script: VecDeque<std::result::Result<ImageStatus, String>>,
    failures: Vec<MockStep>,
    connected: bool,
    name: String,
}

impl MockFingerprintSensor {
    /// Create a new mock sensor and the handle that scripts it.
    pub fn new() -> (Self, MockFingerprintHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stored_tx, stored_rx) = mpsc::unbounded_channel();

        let sensor = Self {
            event_rx,
            stored_tx,
            identify_script: VecDeque::new(),
            image_script: VecDeque::new(),
            failures: Vec::new(),
            connected: true,
            name: "Mock Fingerprint Sensor".to_string(),
        };

        (sensor, MockFingerprintHandle { event_tx, stored_rx })
    }

    /// Move everything queued by the handle into the local scripts.
    fn pump(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                SensorEvent::Identify(outcome) => self.identify_script.push_back(outcome),
                SensorEvent::Image(status) => self.image_script.push_back(status),
                SensorEvent::Fail(step) => self.failures.push(step),
                SensorEvent::Disconnect => self.connected = false,
            }
        }
    }

    fn ensure_connected(&mut self) -> Result<()> {
        self.pump();
        if self.connected {
            Ok(())
        } else {
            Err(HardwareError::disconnected(self.name.clone()))
        }
    }

    /// Consume a scheduled failure for `step`, if any.
    fn take_failure(&mut self, step: MockStep) -> bool {
        match self.failures.iter().position(|s| *s == step) {
            Some(index) => {
                self.failures.remove(index);
                true
            }
            None => false,
        }
    }
}

impl FingerprintSensor for MockFingerprintSensor {
    async fn verify(&mut self) -> Result<()> {
        self.ensure_connected()
    }

    async fn identify(&mut self) -> Result<MatchOutcome> {
        self.ensure_connected()?;
        match self.identify_script.pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(HardwareError::communication(message)),
            None => Ok(MatchOutcome::NoFinger),
        }
    }

    async fn capture_image(&mut self) -> Result<ImageStatus> {
        self.ensure_connected()?;
        match self.image_script.pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(HardwareError::image_capture(message)),
            None => Ok(ImageStatus::NoFinger),
        }
    }

    async fn convert_image(&mut self, slot: TemplateSlot) -> Result<()> {
        self.ensure_connected()?;
        if self.take_failure(MockStep::Convert(slot)) {
            return Err(HardwareError::image_conversion(format!(
                "image too messy for buffer {}",
                slot.buffer_id()
            )));
        }
        Ok(())
    }

    async fn create_model(&mut self) -> Result<()> {
        self.ensure_connected()?;
        if self.take_failure(MockStep::CreateModel) {
            return Err(HardwareError::model_creation("fingerprints did not match"));
        }
        Ok(())
    }

    async fn store_model(&mut self, id: EnrollmentId) -> Result<()> {
        self.ensure_connected()?;
        if self.take_failure(MockStep::StoreModel) {
            return Err(HardwareError::storage(format!("could not write slot {id}")));
        }
        // The handle may already be gone in emulator runs.
        let _ = self.stored_tx.send(id);
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Fingerprint v1.0").with_firmware_version("1.0.0"))
    }
}

/// Handle for scripting a [`MockFingerprintSensor`].
#[derive(Debug)]
pub struct MockFingerprintHandle {
    event_tx: mpsc::UnboundedSender<SensorEvent>,
    stored_rx: mpsc::UnboundedReceiver<EnrollmentId>,
}

impl MockFingerprintHandle {
    fn send(&self, event: SensorEvent) {
        // A dropped sensor simply ignores further scripting.
        let _ = self.event_tx.send(event);
    }

    /// Next `identify()` reports a match for `user_id`.
    pub fn queue_match(&self, user_id: UserId) {
        self.send(SensorEvent::Identify(Ok(MatchOutcome::Matched(user_id))));
    }

    /// Next `identify()` reads a finger that matches nobody.
    pub fn queue_no_match(&self) {
        self.send(SensorEvent::Identify(Ok(MatchOutcome::NoMatch)));
    }

    /// Next `identify()` fails with a driver fault.
    pub fn queue_identify_fault(&self, message: impl Into<String>) {
        self.send(SensorEvent::Identify(Err(message.into())));
    }

    /// Next `capture_image()` returns `status`.
    pub fn queue_image(&self, status: ImageStatus) {
        self.send(SensorEvent::Image(Ok(status)));
    }

    /// Next `capture_image()` fails.
    pub fn queue_image_fault(&self, message: impl Into<String>) {
        self.send(SensorEvent::Image(Err(message.into())));
    }

    /// Script a full touch-lift-touch cycle for one enrollment.
    pub fn queue_enrollment_touches(&self) {
        self.queue_image(ImageStatus::FingerPresent);
        self.queue_image(ImageStatus::NoFinger);
        self.queue_image(ImageStatus::FingerPresent);
    }

    /// The next execution of `step` fails.
    pub fn fail_next(&self, step: MockStep) {
        self.send(SensorEvent::Fail(step));
    }

    /// Every following operation fails with `Disconnected`.
    pub fn disconnect(&self) {
        self.send(SensorEvent::Disconnect);
    }

    /// Pop the next template id written by `store_model()`.
    pub fn try_next_stored(&mut self) -> Option<EnrollmentId> {
        self.stored_rx.try_recv().ok()
    }
}
