//! Two-sample fingerprint enrollment job.
//!
//! The job walks an explicit stage sequence:
//!
//! ```text
//! WaitFirstImage → Capture1 → WaitRemoval → WaitSecondImage
//!     → Capture2 → BuildModel → Store → Done
//! ```
//!
//! Any imaging, conversion, model or storage failure, or running past the
//! job timeout, ends in `Error(reason)`. Every stage entry is reported to
//! the orchestrator as progress; the caller then reports `enroll_done`.

use std::time::Duration;

use kiosk_core::EnrollmentId;
use kiosk_hardware::{AnyFingerprintSensor, FingerprintSensor, HardwareError, ImageStatus, TemplateSlot};
use tracing::{debug, info, warn};

use crate::notifier::{EnrollStatus, ProgressStatus};
use crate::orchestrator::Orchestrator;
use crate::state_machine::EnrollOutcome;

/// Why an enrollment ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollFailure {
    ImageCapture,
    ImageConversion,
    ModelCreation,
    Storage,
    TimedOut,
}

/// Enrollment stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollStage {
    WaitFirstImage,
    Capture1,
    WaitRemoval,
    WaitSecondImage,
    Capture2,
    BuildModel,
    Store,
    Done,
    Error(EnrollFailure),
}

impl EnrollStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    /// Progress message pushed on entering this stage.
    pub fn status(self, target: EnrollmentId) -> EnrollStatus {
        use ProgressStatus::{Error, Go, Success, Wait};

        match self {
            Self::WaitFirstImage => EnrollStatus::new(Go, "Place finger on sensor..."),
            Self::Capture1 => EnrollStatus::new(Wait, "Processing first image..."),
            Self::WaitRemoval => EnrollStatus::new(Wait, "Remove finger..."),
            Self::WaitSecondImage => EnrollStatus::new(Go, "Place same finger again..."),
            Self::Capture2 => EnrollStatus::new(Wait, "Processing second image..."),
            Self::BuildModel => EnrollStatus::new(Wait, "Creating fingerprint model..."),
            Self::Store => EnrollStatus::new(Wait, format!("Storing fingerprint #{target}...")),
            Self::Done => EnrollStatus::new(Success, "Fingerprint enrolled successfully!"),
            Self::Error(failure) => EnrollStatus::new(
                Error,
                match failure {
                    EnrollFailure::ImageCapture => "Error capturing image. Try again.",
                    EnrollFailure::ImageConversion => "Error converting image. Try again.",
                    EnrollFailure::ModelCreation => "Error creating model. Try again.",
                    EnrollFailure::Storage => "Error storing fingerprint. Try again.",
                    EnrollFailure::TimedOut => "Enrollment timed out. Try again.",
                },
            ),
        }
    }
}

/// One enrollment run, borrowing the sensor from the biometric worker.
pub struct EnrollmentWorker<'a> {
    sensor: &'a mut AnyFingerprintSensor,
    orchestrator: &'a Orchestrator,
    target: EnrollmentId,
    stage: EnrollStage,
    timeout: Duration,
    image_poll: Duration,
}

impl<'a> EnrollmentWorker<'a> {
    pub fn new(
        sensor: &'a mut AnyFingerprintSensor,
        orchestrator: &'a Orchestrator,
        target: EnrollmentId,
        timeout: Duration,
        image_poll: Duration,
    ) -> Self {
        Self {
            sensor,
            orchestrator,
            target,
            stage: EnrollStage::WaitFirstImage,
            timeout,
            image_poll,
        }
    }

    pub fn stage(&self) -> EnrollStage {
        self.stage
    }

    /// Run the job to a terminal stage.
    pub async fn run(mut self) -> EnrollOutcome {
        info!(target = %self.target, "Enrollment started");

        let terminal = match tokio::time::timeout(self.timeout, self.drive()).await {
            Ok(Ok(())) => EnrollStage::Done,
            Ok(Err(failure)) => EnrollStage::Error(failure),
            Err(_) => {
                warn!(target = %self.target, stage = ?self.stage, "Enrollment timed out");
                EnrollStage::Error(EnrollFailure::TimedOut)
            }
        };
        self.enter(terminal);

        match terminal {
            EnrollStage::Done => EnrollOutcome::Stored,
            _ => EnrollOutcome::Failed,
        }
    }

    async fn drive(&mut self) -> Result<(), EnrollFailure> {
        self.enter(EnrollStage::WaitFirstImage);
        self.wait_for_finger().await?;

        self.enter(EnrollStage::Capture1);
        let result = self.sensor.convert_image(TemplateSlot::First).await;
        check(result, EnrollFailure::ImageConversion)?;

        self.enter(EnrollStage::WaitRemoval);
        self.wait_for_removal().await;

        self.enter(EnrollStage::WaitSecondImage);
        self.wait_for_finger().await?;

        self.enter(EnrollStage::Capture2);
        let result = self.sensor.convert_image(TemplateSlot::Second).await;
        check(result, EnrollFailure::ImageConversion)?;

        self.enter(EnrollStage::BuildModel);
        let result = self.sensor.create_model().await;
        check(result, EnrollFailure::ModelCreation)?;

        self.enter(EnrollStage::Store);
        let result = self.sensor.store_model(self.target).await;
        check(result, EnrollFailure::Storage)
    }

    fn enter(&mut self, stage: EnrollStage) {
        self.stage = stage;
        if stage.is_terminal() {
            info!(target = %self.target, ?stage, "Enrollment finished");
        } else {
            debug!(target = %self.target, ?stage, "Enrollment stage");
        }
        if let Err(e) = self.orchestrator.report_enrollment(stage.status(self.target)) {
            warn!(error = %e, "Enrollment progress not recorded");
        }
    }

    /// Poll until a finger is on the sensor; a capture fault aborts.
    async fn wait_for_finger(&mut self) -> Result<(), EnrollFailure> {
        loop {
            match self.sensor.capture_image().await {
                Ok(ImageStatus::FingerPresent) => return Ok(()),
                Ok(ImageStatus::NoFinger) => {}
                Err(e) if e.is_transient() => debug!(error = %e, "Image not ready"),
                Err(e) => return check(Err(e), EnrollFailure::ImageCapture),
            }
            tokio::time::sleep(self.image_poll).await;
        }
    }

    /// Poll until the sensor is clear; faults just mean "try again".
    async fn wait_for_removal(&mut self) {
        loop {
            match self.sensor.capture_image().await {
                Ok(ImageStatus::NoFinger) => return,
                Ok(ImageStatus::FingerPresent) => {}
                Err(e) => debug!(error = %e, "Image poll failed while waiting for removal"),
            }
            tokio::time::sleep(self.image_poll).await;
        }
    }
}

fn check(result: kiosk_hardware::Result<()>, failure: EnrollFailure) -> Result<(), EnrollFailure> {
    result.map_err(|e: HardwareError| {
        warn!(error = %e, ?failure, "Enrollment step failed");
        failure
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_cache::FrameCache;
    use crate::notifier::{EventNotifier, PushMessage};
    use crate::state_machine::Event;
    use kiosk_hardware::mock::{MockFingerprintHandle, MockFingerprintSensor, MockStep};
    use std::sync::Arc;

    struct Fixture {
        orchestrator: Orchestrator,
        sensor: AnyFingerprintSensor,
        handle: MockFingerprintHandle,
        _links: crate::orchestrator::OrchestratorLinks,
    }

    fn fixture(target: i64) -> Fixture {
        let (orchestrator, links) =
            Orchestrator::new(Arc::new(FrameCache::default()), EventNotifier::default());
        orchestrator.transition(Event::EnrollRequest(target)).unwrap();
        let (sensor, handle) = MockFingerprintSensor::new();
        Fixture {
            orchestrator,
            sensor: AnyFingerprintSensor::Mock(sensor),
            handle,
            _links: links,
        }
    }

    fn messages(rx: &mut tokio::sync::broadcast::Receiver<PushMessage>) -> Vec<String> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|m| match m {
                PushMessage::EnrollStatus { message, .. } => Some(message),
                PushMessage::Status { .. } => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_enrollment_reports_every_stage() {
        let mut fx = fixture(5);
        let mut rx = fx.orchestrator.subscribe().receiver;
        fx.handle.queue_enrollment_touches();
        let target = EnrollmentId::new(5).unwrap();

        let outcome = EnrollmentWorker::new(
            &mut fx.sensor,
            &fx.orchestrator,
            target,
            Duration::from_secs(60),
            Duration::from_millis(50),
        )
        .run()
        .await;

        assert_eq!(outcome, EnrollOutcome::Stored);
        assert_eq!(fx.handle.try_next_stored(), Some(target));
        assert_eq!(
            messages(&mut rx),
            [
                "Place finger on sensor...",
                "Processing first image...",
                "Remove finger...",
                "Place same finger again...",
                "Processing second image...",
                "Creating fingerprint model...",
                "Storing fingerprint #5...",
                "Fingerprint enrolled successfully!",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_conversion_failure_stops_before_model() {
        let mut fx = fixture(5);
        let mut rx = fx.orchestrator.subscribe().receiver;
        fx.handle.queue_enrollment_touches();
        fx.handle.fail_next(MockStep::Convert(TemplateSlot::Second));

        let outcome = EnrollmentWorker::new(
            &mut fx.sensor,
            &fx.orchestrator,
            EnrollmentId::new(5).unwrap(),
            Duration::from_secs(60),
            Duration::from_millis(50),
        )
        .run()
        .await;

        assert_eq!(outcome, EnrollOutcome::Failed);
        assert_eq!(fx.handle.try_next_stored(), None);
        let seen = messages(&mut rx);
        assert_eq!(seen.last().map(String::as_str), Some("Error converting image. Try again."));
        assert!(seen.contains(&"Processing second image...".to_string()));
        assert!(!seen.contains(&"Creating fingerprint model...".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_fault_while_waiting_fails() {
        let mut fx = fixture(8);
        fx.handle.queue_image_fault("imaging");

        let mut worker = EnrollmentWorker::new(
            &mut fx.sensor,
            &fx.orchestrator,
            EnrollmentId::new(8).unwrap(),
            Duration::from_secs(60),
            Duration::from_millis(50),
        );
        let result = worker.drive().await;

        assert_eq!(result, Err(EnrollFailure::ImageCapture));
        assert_eq!(worker.stage(), EnrollStage::WaitFirstImage);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_finger_times_out() {
        let mut fx = fixture(8);
        let start = tokio::time::Instant::now();

        let outcome = EnrollmentWorker::new(
            &mut fx.sensor,
            &fx.orchestrator,
            EnrollmentId::new(8).unwrap(),
            Duration::from_secs(60),
            Duration::from_millis(50),
        )
        .run()
        .await;

        assert_eq!(outcome, EnrollOutcome::Failed);
        assert!(start.elapsed() >= Duration::from_secs(60));
        let sub = fx.orchestrator.subscribe();
        assert_eq!(
            sub.enroll_status.map(|s| s.message),
            Some("Enrollment timed out. Try again.".to_string())
        );
    }

    #[test]
    fn test_terminal_stages() {
        assert!(EnrollStage::Done.is_terminal());
        assert!(EnrollStage::Error(EnrollFailure::Storage).is_terminal());
        assert!(!EnrollStage::Store.is_terminal());
    }
}
