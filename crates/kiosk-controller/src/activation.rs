//! Worker activation signals.
//!
//! Each worker owns an [`ActivationListener`] and parks on it while
//! inactive. The orchestrator flips the flags for a new state inside its
//! critical section, so flags and state never disagree.

use kiosk_core::SystemState;
use tokio::sync::watch;

/// Returned when the orchestrator side is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("activation source closed")]
pub struct ActivationClosed;

/// Receiving side of one worker's activation flag.
#[derive(Debug, Clone)]
pub struct ActivationListener {
    rx: watch::Receiver<bool>,
}

impl ActivationListener {
    pub fn is_active(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the flag is set. Returns at once if it already is.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationClosed`] once the sending side is dropped; the
    /// worker should exit.
    pub async fn wait_active(&mut self) -> Result<(), ActivationClosed> {
        self.rx
            .wait_for(|active| *active)
            .await
            .map(|_| ())
            .map_err(|_| ActivationClosed)
    }
}

/// Sending side of the three worker flags.
#[derive(Debug)]
pub struct WorkerActivations {
    biometric: watch::Sender<bool>,
    capture: watch::Sender<bool>,
    code: watch::Sender<bool>,
}

/// Listeners handed to the workers at startup.
#[derive(Debug, Clone)]
pub struct ActivationListeners {
    pub biometric: ActivationListener,
    pub capture: ActivationListener,
    pub code: ActivationListener,
}

impl WorkerActivations {
    /// Create flags matching `initial`.
    pub fn new(initial: SystemState) -> (Self, ActivationListeners) {
        let (biometric, biometric_rx) = watch::channel(biometric_active(initial));
        let (capture, capture_rx) = watch::channel(initial.is_scanning());
        let (code, code_rx) = watch::channel(initial.is_scanning());

        (
            Self {
                biometric,
                capture,
                code,
            },
            ActivationListeners {
                biometric: ActivationListener { rx: biometric_rx },
                capture: ActivationListener { rx: capture_rx },
                code: ActivationListener { rx: code_rx },
            },
        )
    }

    /// Set every flag for `state`.
    pub fn apply(&self, state: SystemState) {
        set(&self.biometric, biometric_active(state));
        set(&self.capture, state.is_scanning());
        set(&self.code, state.is_scanning());
    }
}

/// The sensor belongs to the enrollment job while enrolling.
fn biometric_active(state: SystemState) -> bool {
    state != SystemState::Enrolling
}

fn set(flag: &watch::Sender<bool>, value: bool) {
    flag.send_if_modified(|current| {
        let changed = *current != value;
        *current = value;
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case(SystemState::Locked, true, false)]
    #[case(SystemState::Scanning, true, true)]
    #[case(SystemState::Success, true, false)]
    #[case(SystemState::Enrolling, false, false)]
    fn test_flags_per_state(
        #[case] state: SystemState,
        #[case] biometric: bool,
        #[case] scanning: bool,
    ) {
        let (activations, listeners) = WorkerActivations::new(SystemState::Locked);
        activations.apply(state);

        assert_eq!(listeners.biometric.is_active(), biometric);
        assert_eq!(listeners.capture.is_active(), scanning);
        assert_eq!(listeners.code.is_active(), scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_active_parks_until_set() {
        let (activations, listeners) = WorkerActivations::new(SystemState::Locked);
        let mut capture = listeners.capture.clone();

        let waiter = tokio::spawn(async move { capture.wait_active().await });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!waiter.is_finished());

        activations.apply(SystemState::Scanning);
        assert_eq!(waiter.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_wait_active_reports_closed() {
        let (activations, listeners) = WorkerActivations::new(SystemState::Locked);
        let mut code = listeners.code.clone();
        drop(activations);

        assert_eq!(code.wait_active().await, Err(ActivationClosed));
    }
}
