//! The orchestrator: single owner of the kiosk state.
//!
//! All transitions go through [`Orchestrator::transition`]. Inside one
//! critical section on the status register it validates the event against
//! the transition table, performs the side effects that may still fail
//! (dispatching an enrollment job), commits state, payload and session,
//! flips the worker activation flags and pushes the new status. Readers
//! therefore never observe a state whose activation flags or push message
//! disagree with it.
//!
//! The frame cache lock is never taken while the register lock is held.

use std::sync::Arc;

use kiosk_core::constants::{MSG_EMPTY, MSG_SCAN_QR};
use kiosk_core::{AuthenticatedSession, EnrollmentId, Error, Result, StatusRecord, SystemState};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use crate::activation::{ActivationListeners, WorkerActivations};
use crate::frame_cache::FrameCache;
use crate::notifier::{EnrollStatus, EventNotifier, PushMessage};
use crate::state_machine::{Event, StateTransition};
use crate::status::{RegisterState, StatusRegister};

/// Pending enrollments the biometric worker may hold; one at a time.
const ENROLL_QUEUE_CAPACITY: usize = 1;

/// Enrollment job handed to the biometric worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentJob {
    pub target: EnrollmentId,
}

/// Worker-side ends of the orchestrator's channels.
#[derive(Debug)]
pub struct OrchestratorLinks {
    pub activations: ActivationListeners,
    pub enroll_jobs: mpsc::Receiver<EnrollmentJob>,
}

/// Snapshot taken atomically with a push subscription.
#[derive(Debug)]
pub struct Subscription {
    pub status: StatusRecord,
    /// Last enrollment message, present only while enrolling.
    pub enroll_status: Option<EnrollStatus>,
    pub receiver: broadcast::Receiver<PushMessage>,
}

impl Subscription {
    /// Messages a new subscriber should be sent before live updates.
    pub fn snapshot(&self) -> Vec<PushMessage> {
        let mut messages = vec![PushMessage::from(self.status.clone())];
        if let Some(enroll) = &self.enroll_status {
            messages.push(PushMessage::from(enroll.clone()));
        }
        messages
    }
}

/// Owner of the kiosk state and the worker activation flags.
#[derive(Debug)]
pub struct Orchestrator {
    register: StatusRegister,
    notifier: EventNotifier,
    activations: WorkerActivations,
    frames: Arc<FrameCache>,
    enroll_tx: mpsc::Sender<EnrollmentJob>,
    resets: watch::Sender<u64>,
}

impl Orchestrator {
    /// Create an orchestrator in `Locked`.
    pub fn new(frames: Arc<FrameCache>, notifier: EventNotifier) -> (Self, OrchestratorLinks) {
        let (activations, listeners) = WorkerActivations::new(SystemState::Locked);
        let (enroll_tx, enroll_jobs) = mpsc::channel(ENROLL_QUEUE_CAPACITY);
        let (resets, _) = watch::channel(0);

        let orchestrator = Self {
            register: StatusRegister::new(RegisterState::default()),
            notifier,
            activations,
            frames,
            enroll_tx,
            resets,
        };

        (
            orchestrator,
            OrchestratorLinks {
                activations: listeners,
                enroll_jobs,
            },
        )
    }

    pub fn status(&self) -> StatusRecord {
        self.register.get()
    }

    pub fn state(&self) -> SystemState {
        self.register.get().state
    }

    pub fn session(&self) -> Option<AuthenticatedSession> {
        self.register.session()
    }

    pub fn frames(&self) -> &Arc<FrameCache> {
        &self.frames
    }

    /// Accepted QR payload while in `Success`.
    pub fn accepted_code(&self) -> Option<String> {
        let record = self.register.get();
        (record.state == SystemState::Success).then_some(record.payload)
    }

    /// Last `count` applied transitions, oldest first.
    pub fn history(&self, count: usize) -> Vec<StateTransition> {
        self.register.read(|s| s.machine.last_transitions(count))
    }

    /// Apply `event` to the kiosk.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTransition`] if the event is not accepted in the current state
    /// - [`Error::Busy`] for an enroll request outside `Locked`
    /// - [`Error::InvalidArgument`] for an enroll id outside 1..=127
    /// - [`Error::WorkerUnavailable`] if the enrollment job could not be queued
    ///
    /// On error nothing changes.
    pub fn transition(&self, event: Event) -> Result<StateTransition> {
        let event_name = event.name();
        let result = self.register.update(|s| self.apply_locked(s, &event));

        match &result {
            Ok(t) => info!(from = %t.from, to = %t.to, event = t.event, "State transition"),
            Err(e) => debug!(event = event_name, error = %e, "Event rejected"),
        }
        result
    }

    fn apply_locked(&self, s: &mut RegisterState, event: &Event) -> Result<StateTransition> {
        let to = crate::state_machine::next_state(s.state(), event)?;

        let (payload, session) = match event {
            Event::BiometricMatch(user) => (
                MSG_SCAN_QR.to_string(),
                Some(AuthenticatedSession::new(*user)),
            ),
            Event::EnrollRequest(raw) => {
                let target = EnrollmentId::new(*raw)?;
                self.dispatch_enrollment(target)?;
                (format!("Enrolling fingerprint #{target}"), None)
            }
            Event::QrValid(ticket) => (ticket.raw.clone(), s.session.clone()),
            Event::EnrollDone(outcome) => (outcome.message().to_string(), None),
            Event::ResetTimerElapsed => (MSG_EMPTY.to_string(), None),
        };

        let mut transition = s.machine.apply(event)?;
        debug_assert_eq!(transition.to, to);
        transition.session = session.clone();
        s.machine.annotate_last(session.clone());

        s.payload = payload;
        s.session = session;
        s.enroll_status = None;

        self.activations.apply(transition.to);
        self.notifier.push(s.record());

        Ok(transition)
    }

    fn dispatch_enrollment(&self, target: EnrollmentId) -> Result<()> {
        self.enroll_tx
            .try_send(EnrollmentJob { target })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::WorkerUnavailable("enrollment already queued".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    Error::WorkerUnavailable("biometric worker stopped".to_string())
                }
            })
    }

    /// Leave `Success`: back to `Locked`, session and frame cleared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless in `Success`.
    pub async fn reset(&self) -> Result<StateTransition> {
        let state = self.state();
        if state != SystemState::Success {
            return Err(Error::InvalidTransition {
                state: state.to_string(),
                event: Event::ResetTimerElapsed.name().to_string(),
            });
        }
        // Cleared while still in `Success`, so a frame from the next scan
        // can never be wiped.
        self.frames.clear().await;
        let transition = self.transition(Event::ResetTimerElapsed)?;
        self.resets.send_modify(|count| *count += 1);
        info!("Kiosk reset");
        Ok(transition)
    }

    /// Counter bumped after every completed reset.
    pub fn reset_signal(&self) -> watch::Receiver<u64> {
        self.resets.subscribe()
    }

    /// Store and push an enrollment progress message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless enrolling.
    pub fn report_enrollment(&self, status: EnrollStatus) -> Result<()> {
        self.register.update(|s| {
            if s.state() != SystemState::Enrolling {
                return Err(Error::InvalidTransition {
                    state: s.state().to_string(),
                    event: "enroll_progress".to_string(),
                });
            }
            debug!(status = ?status.status, message = %status.message, "Enrollment progress");
            s.enroll_status = Some(status.clone());
            self.notifier.push(status);
            Ok(())
        })
    }

    /// Subscribe to pushes together with a snapshot of the current status.
    pub fn subscribe(&self) -> Subscription {
        self.register.read(|s| Subscription {
            status: s.record(),
            enroll_status: s.enroll_status.clone(),
            receiver: self.notifier.subscribe(),
        })
    }
}
