//! Kiosk state machine.
//!
//! # States
//!
//! - `Locked`: waiting for a known fingerprint
//! - `Scanning`: user authenticated, camera and QR decoder running
//! - `Success`: a laptop code was accepted, held until reset
//! - `Enrolling`: a fingerprint enrollment job owns the sensor
//!
//! # Transition Table
//!
//! | Current   | Event                    | Next      |
//! |-----------|--------------------------|-----------|
//! | Locked    | biometric_match          | Scanning  |
//! | Locked    | enroll_request (1..=127) | Enrolling |
//! | Scanning  | qr_valid                 | Success   |
//! | Enrolling | enroll_done              | Locked    |
//! | Success   | reset_timer_elapsed      | Locked    |
//!
//! An enroll request outside `Locked` is [`Error::Busy`]; an out-of-range id
//! in `Locked` is [`Error::InvalidArgument`]. Every other pair is
//! [`Error::InvalidTransition`] and leaves the state unchanged.
//!
//! # Examples
//!
//! ```
//! use kiosk_controller::{Event, StateMachine};
//! use kiosk_core::{SystemState, UserId};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), SystemState::Locked);
//!
//! machine.apply(&Event::BiometricMatch(UserId::new(7))).unwrap();
//! assert_eq!(machine.current_state(), SystemState::Scanning);
//! ```

use std::collections::VecDeque;

use kiosk_core::{AuthenticatedSession, EnrollmentId, Error, LaptopTicket, Result, SystemState, UserId};
use tokio::time::Instant;

/// Maximum number of transitions kept in history
const MAX_HISTORY_SIZE: usize = 100;

/// Result of a finished enrollment job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    Stored,
    Failed,
}

impl EnrollOutcome {
    /// Status payload shown after returning to `Locked`.
    pub fn message(self) -> &'static str {
        match self {
            Self::Stored => kiosk_core::constants::MSG_ENROLL_SUCCESS,
            Self::Failed => kiosk_core::constants::MSG_ENROLL_FAILED,
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The sensor recognised an enrolled finger.
    BiometricMatch(UserId),
    /// Operator asked to enroll into the given template slot, unvalidated.
    EnrollRequest(i64),
    /// A well-formed laptop code was decoded.
    QrValid(LaptopTicket),
    /// The enrollment job terminated.
    EnrollDone(EnrollOutcome),
    /// The success hold expired.
    ResetTimerElapsed,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BiometricMatch(_) => "biometric_match",
            Self::EnrollRequest(_) => "enroll_request",
            Self::QrValid(_) => "qr_valid",
            Self::EnrollDone(_) => "enroll_done",
            Self::ResetTimerElapsed => "reset_timer_elapsed",
        }
    }
}

/// Look up the next state for `event` in `current`.
///
/// # Errors
///
/// - [`Error::Busy`] for an enroll request outside `Locked`
/// - [`Error::InvalidArgument`] for an enroll request with an id outside 1..=127
/// - [`Error::InvalidTransition`] for any pair not in the table
pub fn next_state(current: SystemState, event: &Event) -> Result<SystemState> {
    use SystemState::*;

    match (current, event) {
        (Locked, Event::BiometricMatch(_)) => Ok(Scanning),
        (Locked, Event::EnrollRequest(raw)) => EnrollmentId::new(*raw).map(|_| Enrolling),
        (_, Event::EnrollRequest(_)) => Err(Error::Busy {
            state: current.to_string(),
        }),
        (Scanning, Event::QrValid(_)) => Ok(Success),
        (Enrolling, Event::EnrollDone(_)) => Ok(Locked),
        (Success, Event::ResetTimerElapsed) => Ok(Locked),
        _ => Err(Error::InvalidTransition {
            state: current.to_string(),
            event: event.name().to_string(),
        }),
    }
}

/// Record of an applied state transition.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: SystemState,
    pub to: SystemState,
    pub event: &'static str,
    /// Instant the new state was entered.
    pub timestamp: Instant,
    /// Session in effect once the transition is applied.
    pub session: Option<AuthenticatedSession>,
}

impl StateTransition {
    fn new(from: SystemState, to: SystemState, event: &'static str) -> Self {
        Self {
            from,
            to,
            event,
            timestamp: Instant::now(),
            session: None,
        }
    }
}

/// Kiosk state machine with bounded transition history.
#[derive(Debug)]
pub struct StateMachine {
    current_state: SystemState,
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in `Locked`.
    pub fn new() -> Self {
        Self {
            current_state: SystemState::Locked,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> SystemState {
        self.current_state
    }

    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last N transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Apply `event`, changing state only if the table allows it.
    ///
    /// # Errors
    ///
    /// See [`next_state`]. On error the machine is left untouched.
    pub fn apply(&mut self, event: &Event) -> Result<StateTransition> {
        let new_state = next_state(self.current_state, event)?;
        let transition = StateTransition::new(self.current_state, new_state, event.name());

        self.current_state = new_state;
        self.add_to_history(transition.clone());

        Ok(transition)
    }

    /// Attach the session to the most recent history entry.
    pub(crate) fn annotate_last(&mut self, session: Option<AuthenticatedSession>) {
        if let Some(last) = self.history.back_mut() {
            last.session = session;
        }
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
