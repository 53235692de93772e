//! Fingerprint polling worker.
//!
//! Owns the sensor for the lifetime of the kiosk. While its activation flag
//! is set it polls `identify()` and reports matches; enrollment jobs arrive
//! over the orchestrator's control channel and run on this same task, so
//! the sensor is never shared.

use std::sync::Arc;
use std::time::Duration;

use kiosk_core::Error;
use kiosk_hardware::{AnyFingerprintSensor, FingerprintSensor, MatchOutcome};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::activation::ActivationListener;
use crate::orchestrator::{EnrollmentJob, Orchestrator};
use crate::state_machine::Event;
use crate::workers::enrollment::EnrollmentWorker;

/// Biometric poll loop.
pub struct BiometricWorker {
    sensor: AnyFingerprintSensor,
    orchestrator: Arc<Orchestrator>,
    active: ActivationListener,
    jobs: mpsc::Receiver<EnrollmentJob>,
    poll_interval: Duration,
    enroll_timeout: Duration,
    enroll_image_poll: Duration,
}

impl BiometricWorker {
    pub fn new(
        sensor: AnyFingerprintSensor,
        orchestrator: Arc<Orchestrator>,
        active: ActivationListener,
        jobs: mpsc::Receiver<EnrollmentJob>,
        config: &crate::ControllerConfig,
    ) -> Self {
        Self {
            sensor,
            orchestrator,
            active,
            jobs,
            poll_interval: config.biometric_poll_interval,
            enroll_timeout: config.enroll_timeout,
            enroll_image_poll: config.enroll_image_poll,
        }
    }

    /// Run until the orchestrator goes away.
    pub async fn run(mut self) {
        info!("Biometric worker started");

        loop {
            tokio::select! {
                biased;

                job = self.jobs.recv() => match job {
                    Some(job) => self.enroll(job).await,
                    None => break,
                },

                activated = self.active.wait_active() => {
                    if activated.is_err() {
                        break;
                    }
                    self.poll_once().await;
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        info!("Biometric worker stopped");
    }

    async fn poll_once(&mut self) {
        match self.sensor.identify().await {
            Ok(MatchOutcome::Matched(user_id)) => {
                info!(%user_id, "Fingerprint matched");
                match self.orchestrator.transition(Event::BiometricMatch(user_id)) {
                    Ok(_) => {}
                    Err(Error::InvalidTransition { state, .. }) => {
                        debug!(%user_id, %state, "Match ignored");
                    }
                    Err(e) => warn!(error = %e, "Match not applied"),
                }
            }
            Ok(MatchOutcome::NoMatch) => debug!("Fingerprint not recognised"),
            Ok(MatchOutcome::NoFinger) => trace!("No finger"),
            Err(e) => match Error::from(e) {
                error if error.is_transient() => debug!(%error, "Fingerprint sensor not ready"),
                error => warn!(%error, "Fingerprint sensor fault"),
            },
        }
    }

    async fn enroll(&mut self, job: EnrollmentJob) {
        let outcome = EnrollmentWorker::new(
            &mut self.sensor,
            &self.orchestrator,
            job.target,
            self.enroll_timeout,
            self.enroll_image_poll,
        )
        .run()
        .await;

        if let Err(e) = self.orchestrator.transition(Event::EnrollDone(outcome)) {
            warn!(error = %e, "Enrollment result not applied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_cache::FrameCache;
    use crate::notifier::EventNotifier;
    use crate::ControllerConfig;
    use kiosk_core::{StatusRecord, SystemState, UserId};
    use kiosk_hardware::mock::{MockFingerprintHandle, MockFingerprintSensor};

    fn spawn_worker() -> (Arc<Orchestrator>, MockFingerprintHandle) {
        let (orchestrator, links) =
            Orchestrator::new(Arc::new(FrameCache::default()), EventNotifier::default());
        let orchestrator = Arc::new(orchestrator);
        let (sensor, handle) = MockFingerprintSensor::new();

        let worker = BiometricWorker::new(
            AnyFingerprintSensor::Mock(sensor),
            Arc::clone(&orchestrator),
            links.activations.biometric,
            links.enroll_jobs,
            &ControllerConfig::default(),
        );
        tokio::spawn(worker.run());
        (orchestrator, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_moves_to_scanning() {
        let (orchestrator, handle) = spawn_worker();

        handle.queue_no_match();
        handle.queue_identify_fault("checksum");
        handle.queue_match(UserId::new(7));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(orchestrator.state(), SystemState::Scanning);
        assert_eq!(orchestrator.session().map(|s| s.user_id), Some(UserId::new(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrollment_runs_on_worker_and_returns_to_locked() {
        let (orchestrator, handle) = spawn_worker();

        handle.queue_enrollment_touches();
        orchestrator.transition(Event::EnrollRequest(12)).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(
            orchestrator.status(),
            StatusRecord::new(SystemState::Locked, "Success Registration")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensor_not_polled_for_matches_while_enrolling() {
        let (orchestrator, handle) = spawn_worker();

        // Queued match would be consumed by identify() if polling continued.
        orchestrator.transition(Event::EnrollRequest(12)).unwrap();
        handle.queue_match(UserId::new(9));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(orchestrator.state(), SystemState::Enrolling);
    }
}
