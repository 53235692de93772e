//! Kiosk controller: the state machine, shared state and background workers.
//!
//! # Components
//!
//! - [`Orchestrator`]: owns [`SystemState`](kiosk_core::SystemState), applies
//!   the transition table and activates workers
//! - [`StatusRegister`]: `(state, payload)` pair plus session, one lock
//! - [`FrameCache`]: latest encoded frame, single slot
//! - [`EventNotifier`]: best-effort push of status and enrollment progress
//! - [`workers`]: biometric polling, frame capture, QR decoding, enrollment
//! - [`Kiosk`]: spawns and supervises the workers
//!
//! # Concurrency
//!
//! Workers are independent tokio tasks. Each inactive worker parks on a
//! `watch` channel; nothing spins. Exactly two locks exist: the status
//! register (`std::sync::Mutex`, never held across `.await`) and the frame
//! slot (`tokio::sync::Mutex`, bounded wait on put). They are never held
//! together.

pub mod activation;
pub mod config;
pub mod frame_cache;
pub mod kiosk;
pub mod notifier;
pub mod orchestrator;
pub mod state_machine;
pub mod status;
pub mod workers;

pub use activation::{ActivationClosed, ActivationListener, ActivationListeners, WorkerActivations};
pub use config::ControllerConfig;
pub use frame_cache::{FrameCache, FrameStats, PutOutcome};
pub use kiosk::{Kiosk, KioskDevices, MockHandles};
pub use notifier::{EnrollStatus, EventNotifier, ProgressStatus, PushMessage};
pub use orchestrator::{EnrollmentJob, Orchestrator, OrchestratorLinks, Subscription};
pub use state_machine::{EnrollOutcome, Event, StateMachine, StateTransition, next_state};
pub use status::{RegisterState, StatusRegister};
