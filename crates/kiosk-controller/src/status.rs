//! Shared status register.
//!
//! Holds the state machine together with the status payload, the current
//! session and the last enrollment message behind one `std::sync::Mutex`.
//! The lock is only ever taken for short synchronous sections and never
//! across an `.await`. A poisoned lock is recovered: the data it guards is
//! always left consistent by the closures that run under it.

use std::sync::{Mutex, MutexGuard};

use kiosk_core::{AuthenticatedSession, StatusRecord, SystemState};

use crate::notifier::EnrollStatus;
use crate::state_machine::StateMachine;

/// Everything guarded by the register lock.
#[derive(Debug, Default)]
pub struct RegisterState {
    pub(crate) machine: StateMachine,
    pub(crate) payload: String,
    pub(crate) session: Option<AuthenticatedSession>,
    pub(crate) enroll_status: Option<EnrollStatus>,
}

impl RegisterState {
    pub fn state(&self) -> SystemState {
        self.machine.current_state()
    }

    /// The `(state, payload)` pair as one value.
    pub fn record(&self) -> StatusRecord {
        StatusRecord::new(self.machine.current_state(), self.payload.clone())
    }
}

/// Status register shared by the orchestrator and every reader.
#[derive(Debug, Default)]
pub struct StatusRegister {
    inner: Mutex<RegisterState>,
}

impl StatusRegister {
    pub fn new(initial: RegisterState) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    /// Consistent snapshot of state and payload.
    pub fn get(&self) -> StatusRecord {
        self.lock().record()
    }

    pub fn session(&self) -> Option<AuthenticatedSession> {
        self.lock().session.clone()
    }

    /// Run `f` with exclusive access. Only the orchestrator writes.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut RegisterState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Read-only access for compound snapshots.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&RegisterState) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, RegisterState> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
