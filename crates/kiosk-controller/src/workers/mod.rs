//! Background workers, one tokio task each.

pub mod biometric;
pub mod capture;
pub mod code;
pub mod enrollment;

pub use biometric::BiometricWorker;
pub use capture::CaptureWorker;
pub use code::CodeWorker;
pub use enrollment::{EnrollFailure, EnrollStage, EnrollmentWorker};
